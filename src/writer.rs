//! MBP-10 CSV writer with exact output formatting.
//!
//! The output schema is fixed: a leading unnamed row-index column, the
//! triggering event's metadata, the three output-schema constants, then
//! ten (price, size, count) triples per side, then symbol and order id.
//!
//! Rendering rules (downstream consumers diff this byte-for-byte):
//! - Prices render as fixed-point decimals derived from the scaled
//!   integer — trailing zeros stripped, trailing point stripped, and a
//!   zero price renders as the empty string.
//! - Sizes and counts always render as decimal integers, zero included.
//! - Timestamps are copied verbatim.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::error::{ReconError, Result};
use crate::types::{
    Action, MbpSnapshot, MAX_DEPTH, MBP_INSTRUMENT_ID, MBP_PUBLISHER_ID, MBP_RTYPE, PRICE_SCALE,
};

/// I/O buffer size for file writing.
const IO_BUFFER_SIZE: usize = 1024 * 1024;

/// Statistics for MBP row writing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterStats {
    /// Rows written (excluding the header)
    pub rows_written: u64,
}

/// MBP-10 CSV writer.
pub struct MbpCsvWriter<W: io::Write> {
    inner: csv::Writer<W>,
    stats: WriterStats,
}

impl MbpCsvWriter<BufWriter<File>> {
    /// Create (truncating) the output file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ReconError::generic(format!("failed to create {}: {e}", path.display()))
        })?;
        Ok(Self::from_writer(BufWriter::with_capacity(
            IO_BUFFER_SIZE,
            file,
        )))
    }
}

impl<W: io::Write> MbpCsvWriter<W> {
    /// Build a writer over any byte sink (useful for tests).
    pub fn from_writer(writer: W) -> Self {
        Self {
            inner: csv::Writer::from_writer(writer),
            stats: WriterStats::default(),
        }
    }

    /// Write the header line. Call once, before any row.
    pub fn write_header(&mut self) -> Result<()> {
        // Leading unnamed column carries the row index.
        self.inner.write_field("")?;
        for name in [
            "ts_recv",
            "ts_event",
            "rtype",
            "publisher_id",
            "instrument_id",
            "action",
            "side",
            "depth",
            "price",
            "size",
            "flags",
            "ts_in_delta",
            "sequence",
        ] {
            self.inner.write_field(name)?;
        }
        for prefix in ["bid", "ask"] {
            for i in 0..MAX_DEPTH {
                self.inner.write_field(format!("{prefix}_px_{i:02}"))?;
                self.inner.write_field(format!("{prefix}_sz_{i:02}"))?;
                self.inner.write_field(format!("{prefix}_ct_{i:02}"))?;
            }
        }
        self.inner.write_field("symbol")?;
        self.inner.write_field("order_id")?;
        self.inner.write_record(None::<&[u8]>)?;
        Ok(())
    }

    /// Write one MBP-10 row.
    pub fn write_snapshot(&mut self, snap: &MbpSnapshot) -> Result<()> {
        self.validate(snap)?;

        self.inner.write_field(snap.row_index.to_string())?;
        self.inner.write_field(&snap.ts_recv)?;
        self.inner.write_field(&snap.ts_event)?;
        self.inner.write_field(MBP_RTYPE.to_string())?;
        self.inner.write_field(MBP_PUBLISHER_ID.to_string())?;
        self.inner.write_field(MBP_INSTRUMENT_ID.to_string())?;
        self.inner.write_field([snap.action.to_byte()])?;
        self.inner.write_field([snap.side.to_byte()])?;
        self.inner.write_field(snap.depth.to_string())?;
        self.inner.write_field(format_price(snap.price))?;
        self.inner.write_field(snap.size.to_string())?;
        self.inner.write_field(snap.flags.to_string())?;
        self.inner.write_field(snap.ts_in_delta.to_string())?;
        self.inner.write_field(snap.sequence.to_string())?;

        for level in snap.bid_levels.iter().chain(snap.ask_levels.iter()) {
            self.inner.write_field(format_price(level.price))?;
            self.inner.write_field(level.size.to_string())?;
            self.inner.write_field(level.count.to_string())?;
        }

        self.inner.write_field(&snap.symbol)?;
        self.inner.write_field(snap.order_id.to_string())?;
        self.inner.write_record(None::<&[u8]>)?;

        self.stats.rows_written += 1;
        Ok(())
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Writing statistics.
    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    /// Flush and unwrap the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| ReconError::generic(format!("failed to flush output: {e}")))
    }

    fn validate(&self, snap: &MbpSnapshot) -> Result<()> {
        let reject = |reason: &str| {
            Err(ReconError::InvalidRow {
                row_index: snap.row_index,
                reason: reason.to_string(),
            })
        };

        if snap.ts_recv.is_empty() || snap.ts_event.is_empty() {
            return reject("empty timestamps");
        }
        if snap.symbol.is_empty() {
            return reject("empty symbol");
        }
        if !matches!(
            snap.action,
            Action::Add | Action::Cancel | Action::Trade | Action::Fill | Action::Clear
        ) {
            return reject("action outside output alphabet");
        }

        Ok(())
    }
}

/// Render a scaled price as a decimal string.
///
/// Zero renders as the empty string; otherwise trailing zeros (and a
/// trailing decimal point) are stripped. Works entirely on the scaled
/// integer, so no float formatting artifacts can leak into the output.
pub fn format_price(scaled: u64) -> String {
    if scaled == 0 {
        return String::new();
    }

    let whole = scaled / PRICE_SCALE;
    let frac = scaled % PRICE_SCALE;

    if frac == 0 {
        return whole.to_string();
    }

    let mut out = format!("{whole}.{frac:09}");
    while out.ends_with('0') {
        out.pop();
    }
    out
}
