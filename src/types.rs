//! Core data types for MBO events and MBP-10 snapshot rows.
//!
//! These types are designed to be:
//! - Exact: prices live as fixed-point integers, never floats
//! - Cheap to move through the hot path (fixed-size fields up front)
//! - Compatible with the MBO CSV schema this pipeline consumes

use serde::{Deserialize, Serialize};

/// Number of price levels carried on each side of an MBP-10 row.
pub const MAX_DEPTH: usize = 10;

/// Fixed-point price scale: prices are stored as `round(price * 1e9)`.
pub const PRICE_SCALE: u64 = 1_000_000_000;

/// Output-schema constant: record type of an MBP-10 row.
pub const MBP_RTYPE: u8 = 10;

/// Output-schema constant: publisher id of this producer's MBP-10 feed.
pub const MBP_PUBLISHER_ID: u16 = 2;

/// Output-schema constant: instrument id of this producer's MBP-10 feed.
pub const MBP_INSTRUMENT_ID: u32 = 1108;

/// Convert a decimal price to its scaled fixed-point form.
#[inline]
pub fn scale_price(price: f64) -> u64 {
    (price * PRICE_SCALE as f64 + 0.5) as u64
}

/// Convert a scaled fixed-point price back to a decimal.
///
/// For output paths prefer rendering from the scaled integer directly;
/// this helper exists for analytics and logging only.
#[inline]
pub fn price_to_f64(scaled: u64) -> f64 {
    scaled as f64 / PRICE_SCALE as f64
}

/// MBO action type (what happened to the order).
///
/// Unrecognized action characters are preserved in `Unknown` so they
/// travel through the pipeline verbatim; the reconstruction engine
/// skips them without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Add new order to book
    Add,
    /// Cancel/remove order
    Cancel,
    /// Trade report (book reduction arrives via the paired Fill+Cancel)
    Trade,
    /// Fill leg of a trade sequence
    Fill,
    /// Clear the book (session reset)
    Clear,
    /// Modify existing order
    Modify,
    /// Any other action character, carried unchanged
    Unknown(u8),
}

impl Action {
    /// Parse an action from its CSV byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'A' => Action::Add,
            b'C' => Action::Cancel,
            b'T' => Action::Trade,
            b'F' => Action::Fill,
            b'R' => Action::Clear,
            b'M' => Action::Modify,
            other => Action::Unknown(other),
        }
    }

    /// Convert back to the CSV byte representation.
    pub fn to_byte(self) -> u8 {
        match self {
            Action::Add => b'A',
            Action::Cancel => b'C',
            Action::Trade => b'T',
            Action::Fill => b'F',
            Action::Clear => b'R',
            Action::Modify => b'M',
            Action::Unknown(b) => b,
        }
    }
}

/// Order side (bid or ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional (used for some trade reports)
    None = b'N',
}

impl Side {
    /// Parse side from a byte. Any byte outside B/A/N is invalid input.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }

    /// The opposite book side. `None` stays `None`.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
            Side::None => Side::None,
        }
    }
}

/// Market By Order (MBO) event.
///
/// One decoded input record. Timestamps are opaque strings reproduced
/// verbatim on output; prices are scaled fixed-point integers.
///
/// # Example
///
/// ```rust
/// use mbp_reconstructor::{Action, MboEvent, Side};
///
/// let ev = MboEvent::new(1001, Action::Add, Side::Bid, 100_000_000_000, 10);
/// assert_eq!(ev.price_as_f64(), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MboEvent {
    /// Reception timestamp, reproduced verbatim
    pub ts_recv: String,

    /// Event timestamp, reproduced verbatim
    pub ts_event: String,

    /// Record type as delivered (not consulted; output uses [`MBP_RTYPE`])
    pub rtype: u8,

    /// Publisher id as delivered (not consulted)
    pub publisher_id: u16,

    /// Instrument id as delivered (not consulted)
    pub instrument_id: u32,

    /// Event action
    pub action: Action,

    /// Event side
    pub side: Side,

    /// Price in fixed-point form (`round(price * 1e9)`); 0 if absent
    pub price: u64,

    /// Order size in shares/contracts; 0 if absent
    pub size: u32,

    /// Event flags
    pub flags: u32,

    /// Timestamp delta
    pub ts_in_delta: u64,

    /// Producer-assigned sequence number
    pub sequence: u64,

    /// Trading symbol
    pub symbol: String,

    /// Unique order identifier
    pub order_id: u64,
}

impl MboEvent {
    /// Create a new event with the fields the book consults; metadata
    /// fields default to empty/zero.
    pub fn new(order_id: u64, action: Action, side: Side, price: u64, size: u32) -> Self {
        Self {
            ts_recv: String::new(),
            ts_event: String::new(),
            rtype: 0,
            publisher_id: 0,
            instrument_id: 0,
            action,
            side,
            price,
            size,
            flags: 0,
            ts_in_delta: 0,
            sequence: 0,
            symbol: String::new(),
            order_id,
        }
    }

    /// Set both timestamps.
    pub fn with_timestamps(
        mut self,
        ts_recv: impl Into<String>,
        ts_event: impl Into<String>,
    ) -> Self {
        self.ts_recv = ts_recv.into();
        self.ts_event = ts_event.into();
        self
    }

    /// Set the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Set the sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Get the price as floating-point dollars.
    #[inline]
    pub fn price_as_f64(&self) -> f64 {
        price_to_f64(self.price)
    }
}

/// One (price, size, count) entry in an MBP-10 row.
///
/// Unpopulated slots carry all zeros; the CSV writer renders a zero
/// price as the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Scaled price of the level (0 if the slot is unused)
    pub price: u64,

    /// Aggregated resting size at the level
    pub size: u64,

    /// Number of resting orders at the level
    pub count: u32,
}

impl Level {
    /// Create a populated level entry.
    pub fn new(price: u64, size: u64, count: u32) -> Self {
        Self { price, size, count }
    }

    /// True if this slot holds no level.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.price == 0 && self.size == 0 && self.count == 0
    }
}

/// One MBP-10 output row.
///
/// Carries the triggering event's metadata verbatim plus the top ten
/// levels of each side at the moment the event altered the book.
/// The `Reconstructor` owns one of these and hands out borrowed views,
/// so nothing is allocated per emitted row beyond the metadata strings
/// it must copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MbpSnapshot {
    /// Dense output row index, starting at 0
    pub row_index: u64,

    /// Reception timestamp of the triggering event, verbatim
    pub ts_recv: String,

    /// Event timestamp of the triggering event, verbatim
    pub ts_event: String,

    /// Action of the triggering event
    pub action: Action,

    /// Side of the triggering event as received
    pub side: Side,

    /// 0-based top-10 rank of the triggering (side, price), or -1
    pub depth: i32,

    /// Scaled price of the triggering event
    pub price: u64,

    /// Size of the triggering event
    pub size: u32,

    /// Flags of the triggering event
    pub flags: u32,

    /// Timestamp delta of the triggering event
    pub ts_in_delta: u64,

    /// Sequence number of the triggering event
    pub sequence: u64,

    /// Symbol of the triggering event
    pub symbol: String,

    /// Order id of the triggering event
    pub order_id: u64,

    /// Best ten bid levels, highest price first
    pub bid_levels: [Level; MAX_DEPTH],

    /// Best ten ask levels, lowest price first
    pub ask_levels: [Level; MAX_DEPTH],
}

impl Default for MbpSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl MbpSnapshot {
    /// Create an empty snapshot row.
    pub fn new() -> Self {
        Self {
            row_index: 0,
            ts_recv: String::new(),
            ts_event: String::new(),
            action: Action::Clear,
            side: Side::None,
            depth: -1,
            price: 0,
            size: 0,
            flags: 0,
            ts_in_delta: 0,
            sequence: 0,
            symbol: String::new(),
            order_id: 0,
            bid_levels: [Level::default(); MAX_DEPTH],
            ask_levels: [Level::default(); MAX_DEPTH],
        }
    }

    /// Number of populated bid slots.
    pub fn active_bid_levels(&self) -> usize {
        self.bid_levels.iter().filter(|l| !l.is_empty()).count()
    }

    /// Number of populated ask slots.
    pub fn active_ask_levels(&self) -> usize {
        self.ask_levels.iter().filter(|l| !l.is_empty()).count()
    }

    /// Best bid price, if any bid slot is populated.
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        (!self.bid_levels[0].is_empty()).then(|| self.bid_levels[0].price)
    }

    /// Best ask price, if any ask slot is populated.
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        (!self.ask_levels[0].is_empty()).then(|| self.ask_levels[0].price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Action and Side tests
    // =========================================================================

    #[test]
    fn test_action_from_byte() {
        assert_eq!(Action::from_byte(b'A'), Action::Add);
        assert_eq!(Action::from_byte(b'C'), Action::Cancel);
        assert_eq!(Action::from_byte(b'T'), Action::Trade);
        assert_eq!(Action::from_byte(b'F'), Action::Fill);
        assert_eq!(Action::from_byte(b'R'), Action::Clear);
        assert_eq!(Action::from_byte(b'M'), Action::Modify);
        assert_eq!(Action::from_byte(b'X'), Action::Unknown(b'X'));
    }

    #[test]
    fn test_action_round_trips_unknown_bytes() {
        for byte in [b'X', b'z', b'?'] {
            assert_eq!(Action::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn test_side_from_byte() {
        assert_eq!(Side::from_byte(b'B'), Some(Side::Bid));
        assert_eq!(Side::from_byte(b'A'), Some(Side::Ask));
        assert_eq!(Side::from_byte(b'N'), Some(Side::None));
        assert_eq!(Side::from_byte(b'X'), None);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::None.opposite(), Side::None);
    }

    // =========================================================================
    // Price scaling tests
    // =========================================================================

    #[test]
    fn test_scale_price() {
        assert_eq!(scale_price(100.0), 100_000_000_000);
        assert_eq!(scale_price(0.000000001), 1);
        assert_eq!(scale_price(5.51), 5_510_000_000);
    }

    #[test]
    fn test_price_to_f64() {
        assert_eq!(price_to_f64(100_000_000_000), 100.0);
        assert!((price_to_f64(5_510_000_000) - 5.51).abs() < 1e-9);
    }

    // =========================================================================
    // MboEvent tests
    // =========================================================================

    #[test]
    fn test_event_builder() {
        let ev = MboEvent::new(42, Action::Add, Side::Ask, 101_000_000_000, 7)
            .with_timestamps("t0", "t1")
            .with_symbol("ARL")
            .with_sequence(99);

        assert_eq!(ev.order_id, 42);
        assert_eq!(ev.ts_recv, "t0");
        assert_eq!(ev.ts_event, "t1");
        assert_eq!(ev.symbol, "ARL");
        assert_eq!(ev.sequence, 99);
        assert_eq!(ev.price_as_f64(), 101.0);
    }

    // =========================================================================
    // Snapshot tests
    // =========================================================================

    #[test]
    fn test_snapshot_starts_empty() {
        let snap = MbpSnapshot::new();
        assert_eq!(snap.active_bid_levels(), 0);
        assert_eq!(snap.active_ask_levels(), 0);
        assert_eq!(snap.best_bid(), None);
        assert_eq!(snap.best_ask(), None);
        assert_eq!(snap.depth, -1);
    }

    #[test]
    fn test_snapshot_best_prices() {
        let mut snap = MbpSnapshot::new();
        snap.bid_levels[0] = Level::new(100_000_000_000, 10, 1);
        snap.ask_levels[0] = Level::new(100_010_000_000, 5, 2);

        assert_eq!(snap.best_bid(), Some(100_000_000_000));
        assert_eq!(snap.best_ask(), Some(100_010_000_000));
        assert_eq!(snap.active_bid_levels(), 1);
        assert_eq!(snap.active_ask_levels(), 1);
    }
}
