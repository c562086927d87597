//! Determinism - identical command streams must produce identical trade
//! streams and identical final state, run after run.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tickmatch::{MatchingEngine, Side, Trade};

#[derive(Clone, Copy, Debug)]
enum Command {
    Limit { id: u64, side: Side, price: i64, qty: u32 },
    Market { id: u64, side: Side, qty: u32 },
    Cancel { id: u64 },
}

fn generate_commands(seed: u64, count: usize) -> Vec<Command> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut commands = Vec::with_capacity(count);
    let mut active_orders: Vec<u64> = Vec::new();
    let mut next_order_id = 1u64;

    for _ in 0..count {
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let roll: f64 = rng.gen();

        if active_orders.is_empty() || roll < 0.65 {
            let id = next_order_id;
            next_order_id += 1;
            commands.push(Command::Limit {
                id,
                side,
                price: rng.gen_range(9500..10500) * 100,
                qty: rng.gen_range(1..500),
            });
            active_orders.push(id);
        } else if roll < 0.75 {
            let id = next_order_id;
            next_order_id += 1;
            commands.push(Command::Market {
                id,
                side,
                qty: rng.gen_range(1..500),
            });
        } else {
            let idx = rng.gen_range(0..active_orders.len());
            let id = active_orders.swap_remove(idx);
            commands.push(Command::Cancel { id });
        }
    }

    commands
}

/// Hash the trade stream, excluding the observational timestamps.
fn hash_trades(trades: &[Trade]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for trade in trades {
        trade.buy_order_id.hash(&mut hasher);
        trade.sell_order_id.hash(&mut hasher);
        trade.price.hash(&mut hasher);
        trade.quantity.hash(&mut hasher);
    }
    hasher.finish()
}

/// Run the command stream and return (trade hash, state hash, trade count).
fn run_engine(commands: &[Command]) -> (u64, u64, u64) {
    let mut engine = MatchingEngine::new(100_000);
    let mut all_trades = Vec::new();

    for command in commands {
        match *command {
            Command::Limit { id, side, price, qty } => {
                all_trades.extend(engine.submit_limit(id, side, price, qty).unwrap());
            }
            Command::Market { id, side, qty } => {
                all_trades.extend(engine.submit_market(id, side, qty).unwrap());
            }
            Command::Cancel { id } => {
                engine.cancel(id);
            }
        }
    }

    engine.audit().unwrap();
    (
        hash_trades(&all_trades),
        engine.state_hash(),
        engine.total_trades(),
    )
}

#[test]
fn test_determinism_small() {
    const SEED: u64 = 0xDEADBEEF;
    const COUNT: usize = 1_000;
    const RUNS: usize = 10;

    let commands = generate_commands(SEED, COUNT);
    let first = run_engine(&commands);

    for run in 1..RUNS {
        assert_eq!(run_engine(&commands), first, "divergence on run {run}");
    }
}

#[test]
fn test_determinism_large() {
    const SEED: u64 = 0xCAFEBABE;
    const COUNT: usize = 50_000;
    const RUNS: usize = 3;

    let commands = generate_commands(SEED, COUNT);
    let first = run_engine(&commands);

    for run in 1..RUNS {
        assert_eq!(run_engine(&commands), first, "divergence on run {run}");
    }
}

#[test]
fn test_different_seeds_diverge() {
    let commands1 = generate_commands(1, 1_000);
    let commands2 = generate_commands(2, 1_000);

    let (trades1, _, _) = run_engine(&commands1);
    let (trades2, _, _) = run_engine(&commands2);

    assert_ne!(trades1, trades2, "different seeds should differ");
}
