//! Two-sided price-level book keyed by scaled price.
//!
//! The book keeps:
//! - `bids`/`asks`: `BTreeMap` of scaled price → [`PriceLevel`]. A single
//!   ascending map per side; bids are iterated in reverse so the best
//!   (highest) bid comes first, asks in natural order so the best
//!   (lowest) ask comes first.
//! - `orders`: ahash map of order_id → (side, price, size) for O(1)
//!   amortized cancels without scanning price levels.
//!
//! Empty levels are erased the moment their last order leaves, so the
//! side maps only ever hold populated levels.

use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::book::price_level::PriceLevel;
use crate::types::{Level, MboEvent, MbpSnapshot, Side, MAX_DEPTH};

/// Per-order record held in the book's order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRef {
    /// Side the order rests on
    pub side: Side,
    /// Scaled price the order rests at
    pub price: u64,
    /// Size as it was added
    pub size: u32,
}

/// Two-sided limit order book for a single instrument.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Bid levels, ascending by key; iterate `.rev()` for best-first
    bids: BTreeMap<u64, PriceLevel>,

    /// Ask levels, ascending by key; natural order is best-first
    asks: BTreeMap<u64, PriceLevel>,

    /// Live order index: order_id → (side, price, size)
    orders: AHashMap<u64, OrderRef>,
}

impl OrderBook {
    /// Create a new empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the book entirely (both sides and the order index).
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }

    /// Add a new order to the book.
    ///
    /// Rejects (without mutating) events with a neutral side, a zero
    /// price or a zero size, and adds whose order id is already live —
    /// the engine favors continuity over strictness, so none of these
    /// are errors.
    ///
    /// Returns `true` iff the resulting level sits in the top ten of
    /// its side.
    pub fn add(&mut self, ev: &MboEvent) -> bool {
        if !(ev.side.is_bid() || ev.side.is_ask()) || ev.price == 0 || ev.size == 0 {
            return false;
        }

        if self.orders.contains_key(&ev.order_id) {
            // Duplicate id for a live order: tolerated, not applied.
            log::debug!("ignoring add for live order id {}", ev.order_id);
            return false;
        }

        let side_map = match ev.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
            Side::None => unreachable!("neutral side rejected above"),
        };
        side_map.entry(ev.price).or_default().add_order(ev.order_id, ev.size);

        self.orders.insert(
            ev.order_id,
            OrderRef {
                side: ev.side,
                price: ev.price,
                size: ev.size,
            },
        );

        self.affects_top(ev.side, ev.price)
    }

    /// Cancel (remove) an order from the book.
    ///
    /// The order's resting (side, price, size) come from the order
    /// index, not from the event, so a cancel with sloppy metadata
    /// still lands on the right level. A cancel for an unknown id is
    /// ignored.
    ///
    /// Returns `true` iff the removed level was in the top ten of its
    /// side *before* the removal.
    pub fn cancel(&mut self, ev: &MboEvent) -> bool {
        let Some(&OrderRef { side, price, .. }) = self.orders.get(&ev.order_id) else {
            return false;
        };

        // Rank must be taken before the level is mutated.
        let affects_top = self.affects_top(side, price);

        let side_map = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
            Side::None => {
                self.orders.remove(&ev.order_id);
                return false;
            }
        };

        if let Some(level) = side_map.get_mut(&price) {
            level.remove_order(ev.order_id);
            if level.is_empty() {
                side_map.remove(&price);
            }
        }

        self.orders.remove(&ev.order_id);

        affects_top
    }

    /// Resolve a trade report against the book. **Does not mutate.**
    ///
    /// A trade's declared side names the resting side that reports the
    /// trade, but the book reduction happens on the side being
    /// consumed. When the declared side has no resting liquidity at the
    /// trade price the effective side is the opposite one; otherwise it
    /// is the declared side. The paired Fill+Cancel events that follow
    /// carry the actual removal.
    ///
    /// Returns the effective side iff the trade touches the top ten of
    /// that side (`None` for neutral trades and off-book prices).
    pub fn trade(&self, ev: &MboEvent) -> Option<Side> {
        if !(ev.side.is_bid() || ev.side.is_ask()) {
            return None;
        }

        let effective = if self.has_liquidity(ev.side, ev.price) {
            ev.side
        } else {
            ev.side.opposite()
        };

        self.affects_top(effective, ev.price).then_some(effective)
    }

    /// 0-based rank of `price` within the top ten of `side`, or -1.
    ///
    /// Both side maps are key-ordered, so this walks at most
    /// [`MAX_DEPTH`] entries.
    pub fn depth(&self, side: Side, price: u64) -> i32 {
        let rank = match side {
            Side::Bid => self
                .bids
                .keys()
                .rev()
                .take(MAX_DEPTH)
                .position(|&p| p == price),
            Side::Ask => self.asks.keys().take(MAX_DEPTH).position(|&p| p == price),
            Side::None => None,
        };

        rank.map_or(-1, |r| r as i32)
    }

    /// True iff (side, price) currently ranks in the top ten.
    #[inline]
    pub fn affects_top(&self, side: Side, price: u64) -> bool {
        self.depth(side, price) >= 0
    }

    /// Populate an MBP-10 row from the current book state plus the
    /// triggering event's metadata.
    ///
    /// `depth_side` is the side the depth lookup runs against: the
    /// event's own side for adds and cancels, the effective side for
    /// trades. The caller owns `out` and assigns its row index.
    pub fn write_snapshot(&self, ev: &MboEvent, depth_side: Side, out: &mut MbpSnapshot) {
        out.ts_recv.clone_from(&ev.ts_recv);
        out.ts_event.clone_from(&ev.ts_event);
        out.action = ev.action;
        out.side = ev.side;
        out.depth = self.depth(depth_side, ev.price);
        out.price = ev.price;
        out.size = ev.size;
        out.flags = ev.flags;
        out.ts_in_delta = ev.ts_in_delta;
        out.sequence = ev.sequence;
        out.symbol.clone_from(&ev.symbol);
        out.order_id = ev.order_id;

        fill_levels(self.bids.iter().rev(), &mut out.bid_levels);
        fill_levels(self.asks.iter(), &mut out.ask_levels);
    }

    /// Best (highest) bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next_back().copied()
    }

    /// Best (lowest) ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    /// Number of live orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of populated bid levels.
    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of populated ask levels.
    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Look up a live order by id.
    pub fn order(&self, order_id: u64) -> Option<&OrderRef> {
        self.orders.get(&order_id)
    }

    /// Look up a populated level by (side, price).
    pub fn level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        match side {
            Side::Bid => self.bids.get(&price),
            Side::Ask => self.asks.get(&price),
            Side::None => None,
        }
    }

    /// Bid prices, best (highest) first.
    pub fn bid_prices(&self) -> impl Iterator<Item = u64> + '_ {
        self.bids.keys().rev().copied()
    }

    /// Ask prices, best (lowest) first.
    pub fn ask_prices(&self) -> impl Iterator<Item = u64> + '_ {
        self.asks.keys().copied()
    }

    /// Live order ids (arbitrary order).
    pub fn order_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.orders.keys().copied()
    }

    /// True if a populated level exists at (side, price).
    fn has_liquidity(&self, side: Side, price: u64) -> bool {
        self.level(side, price).is_some_and(|l| !l.is_empty())
    }
}

/// Copy up to [`MAX_DEPTH`] levels into `out`, zeroing the remainder.
fn fill_levels<'a>(
    iter: impl Iterator<Item = (&'a u64, &'a PriceLevel)>,
    out: &mut [Level; MAX_DEPTH],
) {
    let mut slot = 0;
    for (&price, level) in iter.take(MAX_DEPTH) {
        out[slot] = Level::new(price, level.total_size(), level.order_count());
        slot += 1;
    }
    for entry in out.iter_mut().skip(slot) {
        *entry = Level::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{scale_price, Action};

    fn add(order_id: u64, side: Side, price_dollars: f64, size: u32) -> MboEvent {
        MboEvent::new(order_id, Action::Add, side, scale_price(price_dollars), size)
    }

    fn cancel(order_id: u64, side: Side, price_dollars: f64, size: u32) -> MboEvent {
        MboEvent::new(order_id, Action::Cancel, side, scale_price(price_dollars), size)
    }

    fn trade(side: Side, price_dollars: f64, size: u32) -> MboEvent {
        MboEvent::new(0, Action::Trade, side, scale_price(price_dollars), size)
    }

    #[test]
    fn test_new_book_is_empty() {
        let book = OrderBook::new();
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.bid_level_count(), 0);
        assert_eq!(book.ask_level_count(), 0);
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn test_add_bid_order() {
        let mut book = OrderBook::new();
        assert!(book.add(&add(1, Side::Bid, 100.0, 10)));

        assert_eq!(book.order_count(), 1);
        assert_eq!(book.bid_level_count(), 1);
        assert_eq!(book.best_bid(), Some(scale_price(100.0)));

        let level = book.level(Side::Bid, scale_price(100.0)).unwrap();
        assert_eq!(level.total_size(), 10);
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_events() {
        let mut book = OrderBook::new();

        assert!(!book.add(&add(1, Side::None, 100.0, 10)));
        assert!(!book.add(&MboEvent::new(2, Action::Add, Side::Bid, 0, 10)));
        assert!(!book.add(&MboEvent::new(3, Action::Add, Side::Bid, scale_price(100.0), 0)));

        assert_eq!(book.order_count(), 0);
        assert_eq!(book.bid_level_count(), 0);
    }

    #[test]
    fn test_add_duplicate_id_is_ignored() {
        let mut book = OrderBook::new();
        assert!(book.add(&add(1, Side::Bid, 100.0, 10)));
        assert!(!book.add(&add(1, Side::Bid, 99.0, 5)));

        // First add is untouched; no phantom level appeared.
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.bid_level_count(), 1);
        assert_eq!(book.order(1).unwrap().price, scale_price(100.0));
    }

    #[test]
    fn test_aggregation_at_one_level() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));
        book.add(&add(2, Side::Bid, 100.0, 7));

        let level = book.level(Side::Bid, scale_price(100.0)).unwrap();
        assert_eq!(level.total_size(), 17);
        assert_eq!(level.order_count(), 2);
        assert_eq!(book.bid_level_count(), 1);
    }

    #[test]
    fn test_cancel_removes_order_and_empty_level() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Ask, 101.0, 4));

        assert!(book.cancel(&cancel(1, Side::Ask, 101.0, 4)));
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.ask_level_count(), 0);
        assert!(book.level(Side::Ask, scale_price(101.0)).is_none());
    }

    #[test]
    fn test_cancel_unknown_order_is_ignored() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));

        assert!(!book.cancel(&cancel(999, Side::Bid, 100.0, 10)));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_cancel_twice_second_is_noop() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));

        assert!(book.cancel(&cancel(1, Side::Bid, 100.0, 10)));
        assert!(!book.cancel(&cancel(1, Side::Bid, 100.0, 10)));
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_cancel_uses_indexed_location_not_event_fields() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));

        // Event carries the wrong price; the order index wins.
        assert!(book.cancel(&cancel(1, Side::Bid, 42.0, 10)));
        assert_eq!(book.bid_level_count(), 0);
    }

    #[test]
    fn test_depth_ordering() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 1));
        book.add(&add(2, Side::Bid, 99.0, 1));
        book.add(&add(3, Side::Bid, 101.0, 1));
        book.add(&add(4, Side::Ask, 102.0, 1));
        book.add(&add(5, Side::Ask, 103.0, 1));

        // Bids rank highest-first.
        assert_eq!(book.depth(Side::Bid, scale_price(101.0)), 0);
        assert_eq!(book.depth(Side::Bid, scale_price(100.0)), 1);
        assert_eq!(book.depth(Side::Bid, scale_price(99.0)), 2);

        // Asks rank lowest-first.
        assert_eq!(book.depth(Side::Ask, scale_price(102.0)), 0);
        assert_eq!(book.depth(Side::Ask, scale_price(103.0)), 1);

        // Off-book prices and neutral side rank -1.
        assert_eq!(book.depth(Side::Bid, scale_price(50.0)), -1);
        assert_eq!(book.depth(Side::None, scale_price(100.0)), -1);
    }

    #[test]
    fn test_depth_beyond_top_ten() {
        let mut book = OrderBook::new();
        for i in 0..11u64 {
            book.add(&add(i + 1, Side::Ask, 100.0 + i as f64, 1));
        }

        assert_eq!(book.depth(Side::Ask, scale_price(109.0)), 9);
        assert_eq!(book.depth(Side::Ask, scale_price(110.0)), -1);
        assert!(!book.affects_top(Side::Ask, scale_price(110.0)));
    }

    #[test]
    fn test_add_eleventh_level_not_top() {
        let mut book = OrderBook::new();
        for i in 0..10u64 {
            assert!(book.add(&add(i + 1, Side::Bid, 100.0 - i as f64, 1)));
        }

        // Below the worst of ten: outside the window.
        assert!(!book.add(&add(11, Side::Bid, 80.0, 1)));
        // Above the best: inside the window.
        assert!(book.add(&add(12, Side::Bid, 101.0, 1)));
    }

    #[test]
    fn test_trade_effective_side_declared() {
        let mut book = OrderBook::new();
        book.add(&add(9, Side::Ask, 101.0, 4));

        // Resting liquidity on the declared side: no flip.
        assert_eq!(book.trade(&trade(Side::Ask, 101.0, 4)), Some(Side::Ask));
    }

    #[test]
    fn test_trade_effective_side_flips() {
        let mut book = OrderBook::new();
        book.add(&add(7, Side::Bid, 100.0, 3));

        // Declared ask, but the ask side is empty at 100: bid is consumed.
        assert_eq!(book.trade(&trade(Side::Ask, 100.0, 3)), Some(Side::Bid));
    }

    #[test]
    fn test_trade_neutral_ignored() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));
        assert_eq!(book.trade(&trade(Side::None, 100.0, 10)), None);
    }

    #[test]
    fn test_trade_off_book_price_not_top() {
        let mut book = OrderBook::new();
        for i in 0..10u64 {
            book.add(&add(i + 1, Side::Bid, 100.0 - i as f64, 1));
        }

        // Neither side holds 50.0: flips to ask, which has nothing there.
        assert_eq!(book.trade(&trade(Side::Bid, 50.0, 1)), None);
    }

    #[test]
    fn test_trade_does_not_mutate() {
        let mut book = OrderBook::new();
        book.add(&add(9, Side::Ask, 101.0, 4));

        book.trade(&trade(Side::Ask, 101.0, 4));

        assert_eq!(book.order_count(), 1);
        let level = book.level(Side::Ask, scale_price(101.0)).unwrap();
        assert_eq!(level.total_size(), 4);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));
        book.add(&add(2, Side::Ask, 101.0, 5));

        book.clear();

        assert_eq!(book.order_count(), 0);
        assert_eq!(book.bid_level_count(), 0);
        assert_eq!(book.ask_level_count(), 0);
    }

    #[test]
    fn test_snapshot_population() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));
        book.add(&add(2, Side::Bid, 99.0, 5));
        book.add(&add(3, Side::Ask, 101.0, 7));

        let ev = add(3, Side::Ask, 101.0, 7)
            .with_timestamps("recv", "event")
            .with_symbol("ARL")
            .with_sequence(12);
        let mut snap = MbpSnapshot::new();
        book.write_snapshot(&ev, ev.side, &mut snap);

        assert_eq!(snap.ts_recv, "recv");
        assert_eq!(snap.ts_event, "event");
        assert_eq!(snap.symbol, "ARL");
        assert_eq!(snap.sequence, 12);
        assert_eq!(snap.depth, 0);

        assert_eq!(snap.bid_levels[0], Level::new(scale_price(100.0), 10, 1));
        assert_eq!(snap.bid_levels[1], Level::new(scale_price(99.0), 5, 1));
        assert!(snap.bid_levels[2].is_empty());
        assert_eq!(snap.ask_levels[0], Level::new(scale_price(101.0), 7, 1));
        assert!(snap.ask_levels[1].is_empty());
    }

    #[test]
    fn test_snapshot_truncates_to_ten_levels() {
        let mut book = OrderBook::new();
        for i in 0..12u64 {
            book.add(&add(i + 1, Side::Ask, 100.0 + i as f64, 1));
        }

        let ev = add(1, Side::Ask, 100.0, 1);
        let mut snap = MbpSnapshot::new();
        book.write_snapshot(&ev, ev.side, &mut snap);

        assert_eq!(snap.active_ask_levels(), 10);
        assert_eq!(snap.ask_levels[9].price, scale_price(109.0));
    }

    #[test]
    fn test_snapshot_reuses_buffer() {
        let mut book = OrderBook::new();
        book.add(&add(1, Side::Bid, 100.0, 10));

        let mut snap = MbpSnapshot::new();
        book.write_snapshot(&add(1, Side::Bid, 100.0, 10), Side::Bid, &mut snap);
        assert_eq!(snap.active_bid_levels(), 1);

        book.cancel(&cancel(1, Side::Bid, 100.0, 10));
        book.write_snapshot(&cancel(1, Side::Bid, 100.0, 10), Side::Bid, &mut snap);

        // Stale levels from the previous write must be zeroed out.
        assert_eq!(snap.active_bid_levels(), 0);
        assert_eq!(snap.depth, -1);
    }
}
