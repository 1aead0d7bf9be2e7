//! Event-driven MBP-10 reconstruction driver.
//!
//! The `Reconstructor` owns an [`OrderBook`] and routes MBO events
//! through it in input order, emitting at most one MBP-10 snapshot per
//! event — exactly when the event altered the top ten price levels of
//! either side.
//!
//! Dispatch rules, evaluated in order:
//!
//! 1. The first `Clear` in a stream marks session start: the book is
//!    treated as already empty, nothing is emitted.
//! 2. Subsequent `Clear`s empty the book; nothing is emitted.
//! 3. `Add`/`Cancel` mutate the book and emit iff the touched level is
//!    (or was) in the top ten of its side.
//! 4. `Trade` mutates nothing; it emits iff its *effective* side (the
//!    side actually being consumed, see [`OrderBook::trade`]) ranks in
//!    the top ten. The paired Fill+Cancel that follow carry the
//!    removal.
//! 5. `Fill`, `Modify` and unrecognized actions are no-ops.
//!
//! Snapshots are handed out as borrowed views into a buffer owned by
//! the reconstructor; a returned reference is valid until the next
//! `process` call, which keeps the hot path allocation-free.

use crate::book::order_book::OrderBook;
use crate::types::{Action, MboEvent, MbpSnapshot, Side};
use crate::warnings::{WarningCategory, WarningTracker};

/// Per-action processing statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconStats {
    /// Total events processed
    pub events_processed: u64,

    /// Snapshots emitted
    pub snapshots_emitted: u64,

    /// Add events seen
    pub adds: u64,

    /// Cancel events seen
    pub cancels: u64,

    /// Trade events seen
    pub trades: u64,

    /// Fill events seen (no-ops)
    pub fills: u64,

    /// Clear events seen (including the suppressed initial one)
    pub clears: u64,

    /// Modify events seen (no-ops)
    pub modifies: u64,

    /// Events skipped outright (unknown actions)
    pub skipped: u64,
}

/// Event-driven driver that turns an MBO stream into MBP-10 rows.
///
/// # Example
///
/// ```rust
/// use mbp_reconstructor::{Action, MboEvent, Reconstructor, Side};
///
/// let mut recon = Reconstructor::new();
///
/// let ev = MboEvent::new(1, Action::Add, Side::Bid, 100_000_000_000, 10);
/// let snap = recon.process(&ev).expect("top-of-book add emits a row");
///
/// assert_eq!(snap.row_index, 0);
/// assert_eq!(snap.bid_levels[0].size, 10);
/// ```
#[derive(Debug)]
pub struct Reconstructor {
    /// The book being reconstructed
    book: OrderBook,

    /// Whether the session-start Clear has been consumed
    first_clear_consumed: bool,

    /// Reusable snapshot buffer handed out by borrowed view
    row: MbpSnapshot,

    /// Next dense row index
    next_row_index: u64,

    /// Processing statistics
    stats: ReconStats,

    /// Tolerated-anomaly log
    warnings: WarningTracker,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor {
    /// Create a reconstructor over an empty book.
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
            first_clear_consumed: false,
            row: MbpSnapshot::new(),
            next_row_index: 0,
            stats: ReconStats::default(),
            warnings: WarningTracker::new(),
        }
    }

    /// Process one event.
    ///
    /// Returns a borrowed snapshot iff the event produced a top-10
    /// change. The reference is valid until the next `process` call;
    /// consume or copy it before feeding the next event.
    pub fn process(&mut self, ev: &MboEvent) -> Option<&MbpSnapshot> {
        self.stats.events_processed += 1;

        let depth_side = match ev.action {
            Action::Clear => {
                self.stats.clears += 1;
                self.apply_clear(ev);
                None
            }
            Action::Add => {
                self.stats.adds += 1;
                self.apply_add(ev)
            }
            Action::Cancel => {
                self.stats.cancels += 1;
                self.apply_cancel(ev)
            }
            Action::Trade => {
                self.stats.trades += 1;
                self.book.trade(ev)
            }
            Action::Fill => {
                // Reduction arrives via the paired Cancel.
                self.stats.fills += 1;
                None
            }
            Action::Modify => {
                self.stats.modifies += 1;
                None
            }
            Action::Unknown(byte) => {
                self.stats.skipped += 1;
                self.warnings.record_order(
                    WarningCategory::UnknownAction,
                    format!("skipping unknown action '{}'", byte as char),
                    ev.order_id,
                    ev.sequence,
                );
                None
            }
        };

        let depth_side = depth_side?;

        self.book.write_snapshot(ev, depth_side, &mut self.row);
        self.row.row_index = self.next_row_index;
        self.next_row_index += 1;
        self.stats.snapshots_emitted += 1;

        Some(&self.row)
    }

    fn apply_clear(&mut self, ev: &MboEvent) {
        if !self.first_clear_consumed {
            // Session-start marker: the book is already empty.
            self.first_clear_consumed = true;
            return;
        }

        self.warnings.record_order(
            WarningCategory::BookCleared,
            "book cleared mid-session",
            ev.order_id,
            ev.sequence,
        );
        self.book.clear();
    }

    fn apply_add(&mut self, ev: &MboEvent) -> Option<Side> {
        if !(ev.side.is_bid() || ev.side.is_ask()) || ev.price == 0 || ev.size == 0 {
            self.warnings.record_order(
                WarningCategory::RejectedAdd,
                format!(
                    "rejecting add: side={}, price={}, size={}",
                    ev.side.to_byte() as char,
                    ev.price,
                    ev.size
                ),
                ev.order_id,
                ev.sequence,
            );
            return None;
        }

        if self.book.order(ev.order_id).is_some() {
            self.warnings.record_order(
                WarningCategory::DuplicateOrderId,
                format!("ignoring add for live order {}", ev.order_id),
                ev.order_id,
                ev.sequence,
            );
            return None;
        }

        self.book.add(ev).then_some(ev.side)
    }

    fn apply_cancel(&mut self, ev: &MboEvent) -> Option<Side> {
        if self.book.order(ev.order_id).is_none() {
            // Already cancelled or never seen; not an error in real streams.
            self.warnings.record_order(
                WarningCategory::OrderNotFound,
                format!("cancel for unknown order {}", ev.order_id),
                ev.order_id,
                ev.sequence,
            );
            return None;
        }

        self.book.cancel(ev).then_some(ev.side)
    }

    /// The underlying book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Processing statistics.
    pub fn stats(&self) -> &ReconStats {
        &self.stats
    }

    /// Tolerated-anomaly log.
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// Number of rows emitted so far (equals the next row index).
    pub fn rows_emitted(&self) -> u64 {
        self.next_row_index
    }

    /// Reset to a fresh session: empty book, first-clear flag re-armed,
    /// row index back to 0, statistics and warnings wiped.
    pub fn reset(&mut self) {
        self.book.clear();
        self.first_clear_consumed = false;
        self.next_row_index = 0;
        self.stats = ReconStats::default();
        self.warnings.clear();
    }
}
