//! Demo driver: seeds a book with literal orders, crosses it with a limit
//! and a market order, cancels, and prints the book after each step.

use anyhow::Result;
use tickmatch::{MatchingEngine, Side, Trade};
use tracing::info;

/// Print the top `depth` levels of each side, asks on top (highest first),
/// the spread in the middle, bids below.
fn print_book(engine: &MatchingEngine, depth: usize) {
    let book = engine.book();
    println!("\n========== ORDER BOOK ==========");

    for (price, qty, orders) in book.depth(Side::Sell, depth).iter().rev() {
        println!("  ASK  {price:>8}  |  qty: {qty:>6}  |  orders: {orders}");
    }

    match book.spread() {
        Some(spread) => println!("  -------- spread: {spread} --------"),
        None => println!("  -------- spread: N/A --------"),
    }

    for (price, qty, orders) in book.depth(Side::Buy, depth) {
        println!("  BID  {price:>8}  |  qty: {qty:>6}  |  orders: {orders}");
    }

    println!("================================\n");
}

fn report_trades(trades: &[Trade]) {
    for trade in trades {
        info!("  {trade}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut engine = MatchingEngine::new(1 << 16);
    engine.warm_up();

    // --- Step 1: build up the book with resting orders ---
    info!("step 1: adding resting limit orders");

    engine.submit_limit(1, Side::Sell, 10200, 50)?; // Sell 50 @ 102.00
    engine.submit_limit(2, Side::Sell, 10150, 30)?; // Sell 30 @ 101.50
    engine.submit_limit(3, Side::Sell, 10100, 100)?; // Sell 100 @ 101.00
    engine.submit_limit(4, Side::Sell, 10100, 40)?; // Sell 40 @ 101.00 (queued behind 3)

    engine.submit_limit(5, Side::Buy, 10000, 75)?; // Buy 75 @ 100.00
    engine.submit_limit(6, Side::Buy, 9950, 20)?; // Buy 20 @ 99.50
    engine.submit_limit(7, Side::Buy, 9900, 40)?; // Buy 40 @ 99.00

    print_book(&engine, 5);

    // --- Step 2: a buy that crosses the spread ---
    info!("step 2: aggressive buy, 80 @ 101.00");

    let trades = engine.submit_limit(8, Side::Buy, 10100, 80)?;
    report_trades(&trades);
    print_book(&engine, 5);

    // --- Step 3: a market order ---
    info!("step 3: market sell, 50");

    let trades = engine.submit_market(9, Side::Sell, 50)?;
    report_trades(&trades);
    print_book(&engine, 5);

    // --- Step 4: cancel a resting order ---
    info!("step 4: cancel order 7 (Buy 40 @ 99.00)");

    let cancelled = engine.cancel(7);
    info!("  cancelled: {cancelled}");
    print_book(&engine, 5);

    info!(
        "total orders processed: {}, total trades executed: {}",
        engine.total_orders(),
        engine.total_trades()
    );

    Ok(())
}
