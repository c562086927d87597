//! Per-operation latency percentiles, measured with an HDR histogram.
//!
//! Submissions are split into insert (no trade) and match (produced trades)
//! distributions, followed by a cancel pass over the surviving orders.

use hdrhistogram::Histogram;
use std::time::Instant;
use tickmatch::{MatchingEngine, Side};

const SUBMISSIONS: u64 = 1_000_000;

fn print_stats(label: &str, histogram: &Histogram<u64>) {
    if histogram.len() == 0 {
        println!("  {label}: no data");
        return;
    }
    println!("  {label}:");
    println!("    Count:  {:>8}", histogram.len());
    println!("    Min:    {:>8} ns", histogram.min());
    println!("    P50:    {:>8} ns", histogram.value_at_quantile(0.50));
    println!("    P90:    {:>8} ns", histogram.value_at_quantile(0.90));
    println!("    P99:    {:>8} ns", histogram.value_at_quantile(0.99));
    println!("    P99.9:  {:>8} ns", histogram.value_at_quantile(0.999));
    println!("    Max:    {:>8} ns", histogram.max());
    println!();
}

fn main() {
    // Pin to the last core; it is usually the least interrupted
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last_core) = core_ids.last() {
            core_affinity::set_for_current(*last_core);
        }
    }

    println!("Preparing latency benchmark...");

    let mut engine = MatchingEngine::new(2_000_000);
    engine.warm_up();

    let mut insert_hist = Histogram::<u64>::new_with_bounds(1, 1_000_000, 3).unwrap();
    let mut match_hist = Histogram::<u64>::new_with_bounds(1, 1_000_000, 3).unwrap();
    let mut cancel_hist = Histogram::<u64>::new_with_bounds(1, 1_000_000, 3).unwrap();

    // Deterministic workload: a prime stride walks the price band so both
    // sides interleave and a realistic share of submissions cross.
    let price_of = |i: u64| 9900 + ((i * 7919) % 200) as i64;
    let qty_of = |i: u64| 1 + (i % 100) as u32;

    // Warm the branch predictor before measuring
    println!("Warming up...");
    for i in 0..10_000u64 {
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        let _ = engine.submit_limit(u64::MAX - i, side, price_of(i), qty_of(i));
    }

    println!("Running {SUBMISSIONS} submissions...");
    let run_start = Instant::now();

    for i in 0..SUBMISSIONS {
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        let price = price_of(i);
        let qty = qty_of(i);

        let start = Instant::now();
        let trades = std::hint::black_box(engine.submit_limit(i, side, price, qty));
        let elapsed = start.elapsed().as_nanos() as u64;

        match trades {
            Ok(trades) if trades.is_empty() => insert_hist.record(elapsed).unwrap_or(()),
            Ok(_) => match_hist.record(elapsed).unwrap_or(()),
            Err(_) => {}
        }
    }

    let total = run_start.elapsed();
    println!(
        "Throughput: {:.0} orders/sec",
        SUBMISSIONS as f64 / total.as_secs_f64()
    );
    println!("Resting after submissions: {} orders\n", engine.order_count());

    println!("Cancelling...");
    let mut cancelled = 0u64;
    for i in 0..SUBMISSIONS {
        let start = Instant::now();
        let hit = std::hint::black_box(engine.cancel(i));
        let elapsed = start.elapsed().as_nanos() as u64;

        if hit {
            cancelled += 1;
            cancel_hist.record(elapsed).unwrap_or(());
        }
    }
    println!("Cancelled {cancelled} resting orders\n");

    println!("=== Latency Report (ns) ===");
    print_stats("Insert (no match)", &insert_hist);
    print_stats("Match (produced trades)", &match_hist);
    print_stats("Cancel", &cancel_hist);
}
