//! Matcher - the cross-and-fill loop.
//!
//! Drains best-price levels on the opposing side under the incoming order's
//! price barrier (market orders have none), fills resting orders FIFO, and
//! reports fully-filled resting slots back to the facade for recycling.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::order_book::OrderBook;
use crate::pool::{SlotIndex, SlotPool};
use crate::price_level::PriceLevel;
use crate::types::{OrderId, OrderKind, Price, Side, Trade};

/// What one submission produced: executed trades in consumption order, and
/// the resting orders that became fully filled (their slots are owed back to
/// the pool by the caller).
#[derive(Debug, Default)]
pub struct MatchResult {
    /// Trades in execution order: strict price priority across levels,
    /// FIFO within a level
    pub trades: Vec<Trade>,
    /// Slots of resting orders fully filled during this call
    pub filled: Vec<SlotIndex>,
}

/// Consume the incoming order's remaining quantity against the opposite side.
///
/// On return the incoming order either has zero remaining or no further
/// crossing is possible; the caller decides whether the residual rests
/// (limit) or is discarded (market). Emptied levels are erased before the
/// best price is re-evaluated, so the book is never left with an empty level.
pub fn execute(
    book: &mut OrderBook,
    pool: &mut SlotPool,
    taker: SlotIndex,
    timestamp_ns: u64,
) -> MatchResult {
    let mut result = MatchResult::default();
    match pool.get(taker).side {
        Side::Buy => match_buy(book, pool, taker, timestamp_ns, &mut result),
        Side::Sell => match_sell(book, pool, taker, timestamp_ns, &mut result),
    }
    result
}

/// Incoming BUY consumes resting ASKS, lowest price first.
/// A limit buy crosses while its price >= the best ask price.
fn match_buy(
    book: &mut OrderBook,
    pool: &mut SlotPool,
    taker: SlotIndex,
    timestamp_ns: u64,
    out: &mut MatchResult,
) {
    while pool.get(taker).remaining > 0 {
        let ask_price = match book.asks.first_key_value() {
            Some((&price, _)) => price,
            None => break,
        };

        let order = pool.get(taker);
        if order.kind == OrderKind::Limit && order.price < ask_price {
            break;
        }

        let emptied = fill_level(
            &mut book.asks,
            &mut book.ids,
            pool,
            ask_price,
            taker,
            timestamp_ns,
            out,
        );
        if emptied {
            book.asks.remove(&ask_price);
        }
    }
}

/// Incoming SELL consumes resting BIDS, highest price first.
/// A limit sell crosses while its price <= the best bid price.
fn match_sell(
    book: &mut OrderBook,
    pool: &mut SlotPool,
    taker: SlotIndex,
    timestamp_ns: u64,
    out: &mut MatchResult,
) {
    while pool.get(taker).remaining > 0 {
        let bid_price = match book.bids.last_key_value() {
            Some((&price, _)) => price,
            None => break,
        };

        let order = pool.get(taker);
        if order.kind == OrderKind::Limit && order.price > bid_price {
            break;
        }

        let emptied = fill_level(
            &mut book.bids,
            &mut book.ids,
            pool,
            bid_price,
            taker,
            timestamp_ns,
            out,
        );
        if emptied {
            book.bids.remove(&bid_price);
        }
    }
}

/// Fill against the FIFO queue of one price level until either the level or
/// the incoming order is exhausted.
///
/// Trades execute at the level's price (price improvement goes to the
/// aggressor). Fully filled resting orders leave the id map and the queue
/// front, and are appended to `out.filled` for slot recycling.
///
/// # Returns
/// `true` if the level is now empty and must be erased from its side map.
#[allow(clippy::too_many_arguments)]
fn fill_level(
    levels: &mut BTreeMap<Price, PriceLevel>,
    ids: &mut FxHashMap<OrderId, SlotIndex>,
    pool: &mut SlotPool,
    price: Price,
    taker: SlotIndex,
    timestamp_ns: u64,
    out: &mut MatchResult,
) -> bool {
    let Some(level) = levels.get_mut(&price) else {
        return false;
    };

    while pool.get(taker).remaining > 0 {
        let Some(maker) = level.front() else {
            break;
        };

        // min() keeps both unsigned quantities from underflowing
        let fill_qty = pool.get(taker).remaining.min(pool.get(maker).remaining);
        pool.get_mut(taker).fill(fill_qty);
        pool.get_mut(maker).fill(fill_qty);
        level.deduct(fill_qty);

        let (taker_id, taker_side) = {
            let order = pool.get(taker);
            (order.id, order.side)
        };
        let maker_id = pool.get(maker).id;
        let (buy_order_id, sell_order_id) = match taker_side {
            Side::Buy => (taker_id, maker_id),
            Side::Sell => (maker_id, taker_id),
        };
        out.trades.push(Trade {
            buy_order_id,
            sell_order_id,
            price,
            quantity: fill_qty,
            timestamp_ns,
        });

        if pool.get(maker).is_filled() {
            ids.remove(&maker_id);
            level.take_front(pool);
            out.filled.push(maker);
        }
    }

    level.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Order;
    use crate::types::Quantity;

    fn rest_limit(
        book: &mut OrderBook,
        pool: &mut SlotPool,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) {
        let idx = pool
            .acquire(Order::new(id, side, OrderKind::Limit, price, qty, 0))
            .unwrap();
        book.insert(pool, idx);
    }

    fn submit(
        book: &mut OrderBook,
        pool: &mut SlotPool,
        id: OrderId,
        side: Side,
        kind: OrderKind,
        price: Price,
        qty: Quantity,
    ) -> (MatchResult, SlotIndex) {
        let idx = pool
            .acquire(Order::new(id, side, kind, price, qty, 0))
            .unwrap();
        let result = execute(book, pool, idx, 0);
        (result, idx)
    }

    #[test]
    fn test_no_cross_no_trades() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10100, 50);

        let (result, taker) = submit(
            &mut book,
            &mut pool,
            2,
            Side::Buy,
            OrderKind::Limit,
            10000,
            50,
        );
        assert!(result.trades.is_empty());
        assert!(result.filled.is_empty());
        assert_eq!(pool.get(taker).remaining, 50);
        assert_eq!(book.best_ask(), Some(10100));
    }

    #[test]
    fn test_exact_cross_consumes_both() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10000, 50);

        let (result, taker) = submit(
            &mut book,
            &mut pool,
            2,
            Side::Buy,
            OrderKind::Limit,
            10000,
            50,
        );
        assert_eq!(result.trades.len(), 1);
        assert_eq!(
            result.trades[0],
            Trade {
                buy_order_id: 2,
                sell_order_id: 1,
                price: 10000,
                quantity: 50,
                timestamp_ns: 0,
            }
        );
        assert_eq!(result.filled.len(), 1);
        assert_eq!(pool.get(taker).remaining, 0);
        assert!(book.is_empty());
        assert_eq!(book.ask_level_count(), 0, "emptied level erased");
    }

    #[test]
    fn test_trade_sides_oriented_by_aggressor() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Buy, 10000, 50);

        let (result, _) = submit(
            &mut book,
            &mut pool,
            2,
            Side::Sell,
            OrderKind::Limit,
            10000,
            50,
        );
        assert_eq!(result.trades[0].buy_order_id, 1, "resting buyer");
        assert_eq!(result.trades[0].sell_order_id, 2, "aggressing seller");
    }

    #[test]
    fn test_partial_fill_leaves_maker_total_consistent() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10000, 100);

        let (result, _) = submit(
            &mut book,
            &mut pool,
            2,
            Side::Buy,
            OrderKind::Limit,
            10000,
            30,
        );
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].quantity, 30);
        assert!(result.filled.is_empty());
        assert_eq!(book.depth(Side::Sell, 1), vec![(10000, 70, 1)]);
        book.audit(&pool).unwrap();
    }

    #[test]
    fn test_fifo_within_level() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10000, 30);
        rest_limit(&mut book, &mut pool, 2, Side::Sell, 10000, 40);
        rest_limit(&mut book, &mut pool, 3, Side::Sell, 10000, 50);

        let (result, _) = submit(
            &mut book,
            &mut pool,
            4,
            Side::Buy,
            OrderKind::Limit,
            10000,
            100,
        );
        let sellers: Vec<_> = result.trades.iter().map(|t| t.sell_order_id).collect();
        assert_eq!(sellers, vec![1, 2, 3]);
        assert_eq!(result.trades[2].quantity, 30, "third order partially filled");
        assert_eq!(result.filled.len(), 2);
    }

    #[test]
    fn test_price_priority_across_levels() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10020, 50);
        rest_limit(&mut book, &mut pool, 2, Side::Sell, 10000, 50);
        rest_limit(&mut book, &mut pool, 3, Side::Sell, 10010, 50);

        let (result, _) = submit(
            &mut book,
            &mut pool,
            4,
            Side::Buy,
            OrderKind::Limit,
            10020,
            150,
        );
        let prices: Vec<_> = result.trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![10000, 10010, 10020]);
    }

    #[test]
    fn test_market_order_has_no_barrier() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10000, 50);
        rest_limit(&mut book, &mut pool, 2, Side::Sell, 10100, 50);

        let (result, taker) = submit(
            &mut book,
            &mut pool,
            3,
            Side::Buy,
            OrderKind::Market,
            0,
            75,
        );
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].price, 10000);
        assert_eq!(result.trades[0].quantity, 50);
        assert_eq!(result.trades[1].price, 10100);
        assert_eq!(result.trades[1].quantity, 25);
        assert_eq!(pool.get(taker).remaining, 0);
        assert_eq!(book.depth(Side::Sell, 1), vec![(10100, 25, 1)]);
    }

    #[test]
    fn test_market_order_stops_on_empty_book() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Buy, 10000, 40);

        let (result, taker) = submit(
            &mut book,
            &mut pool,
            2,
            Side::Sell,
            OrderKind::Market,
            0,
            100,
        );
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].quantity, 40);
        assert_eq!(pool.get(taker).remaining, 60, "residual left for caller");
        assert!(book.is_empty());
    }

    #[test]
    fn test_filled_makers_leave_id_map_before_return() {
        let mut pool = SlotPool::new(100);
        let mut book = OrderBook::new();
        rest_limit(&mut book, &mut pool, 1, Side::Sell, 10000, 50);

        let (result, _) = submit(
            &mut book,
            &mut pool,
            2,
            Side::Buy,
            OrderKind::Limit,
            10000,
            50,
        );
        assert!(!book.contains(1));
        assert_eq!(result.filled.len(), 1);
    }
}
