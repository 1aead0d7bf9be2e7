//! # mbp-reconstructor
//!
//! MBP-10 depth snapshot reconstruction from an MBO event stream for a
//! single trading instrument.
//!
//! The input is a sequence of per-order events (adds, cancels, trades,
//! fills, book clears); the output is a sequence of depth rows, each
//! showing the best ten bid and ask price levels (price, aggregated
//! size, order count) at the moment an event altered the book's top
//! ten.
//!
//! ## Features
//!
//! - **Exact prices**: fixed-point `u64` at 1e-9 resolution end to end;
//!   decimals are recovered only at the output boundary
//! - **O(log L) book mutation** with O(1) amortized cancels via a
//!   per-order index
//! - **Allocation-free hot path**: snapshots are borrowed views into a
//!   buffer owned by the driver
//! - **T→F→C coalescing**: trade reports resolve their effective book
//!   side from book state; the paired Fill+Cancel carry the removal
//! - **Tolerant streaming**: bad records, unknown ids and unknown
//!   actions are logged, counted and skipped, never fatal
//!
//! ## Quick Start
//!
//! ```rust
//! use mbp_reconstructor::{Action, MboEvent, Reconstructor, Side};
//!
//! let mut recon = Reconstructor::new();
//!
//! let ev = MboEvent::new(1001, Action::Add, Side::Bid, 100_000_000_000, 10);
//! if let Some(snap) = recon.process(&ev) {
//!     assert_eq!(snap.row_index, 0);
//!     assert_eq!(snap.bid_levels[0].price, 100_000_000_000);
//!     assert_eq!(snap.bid_levels[0].size, 10);
//!     assert_eq!(snap.bid_levels[0].count, 1);
//! }
//! ```
//!
//! ## File-to-file reconstruction
//!
//! ```ignore
//! use mbp_reconstructor::{MboCsvReader, MbpCsvWriter, Reconstructor};
//!
//! let reader = MboCsvReader::from_path("input_mbo.csv")?;
//! let mut writer = MbpCsvWriter::from_path("output_mbp.csv")?;
//! writer.write_header()?;
//!
//! let mut recon = Reconstructor::new();
//! for ev in reader.events() {
//!     if let Some(snap) = recon.process(&ev) {
//!         writer.write_snapshot(snap)?;
//!     }
//! }
//! writer.flush()?;
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `MboEvent`, `MbpSnapshot`, `Action`, `Side` |
//! | [`book`] | Reconstruction engine: `PriceLevel`, `OrderBook`, `Reconstructor` |
//! | [`reader`] | Streaming MBO CSV input |
//! | [`writer`] | Exact-format MBP-10 CSV output |
//! | [`source`] | Provider-agnostic event-source trait |
//! | [`warnings`] | Tolerated-anomaly tracking |

pub mod book;
pub mod error;
pub mod reader;
pub mod source;
pub mod types;
pub mod warnings;
pub mod writer;

// Re-exports - Core types
pub use error::{ReconError, Result};
pub use types::{
    price_to_f64, scale_price, Action, Level, MboEvent, MbpSnapshot, Side, MAX_DEPTH,
    MBP_INSTRUMENT_ID, MBP_PUBLISHER_ID, MBP_RTYPE, PRICE_SCALE,
};

// Re-exports - Reconstruction engine
pub use book::{OrderBook, OrderRef, PriceLevel, ReconStats, Reconstructor};

// Re-exports - I/O
pub use reader::{MboCsvReader, ReaderStats};
pub use source::{CsvSource, MarketDataSource, SourceMetadata, VecSource};
pub use writer::{MbpCsvWriter, WriterStats};

// Re-exports - Warnings
pub use warnings::{Warning, WarningCategory, WarningSummary, WarningTracker};
