//! Warning tracking for tolerated stream anomalies.
//!
//! The reconstruction engine never fails on a recoverable anomaly
//! (cancel for an unknown id, duplicate add, unknown action); it skips
//! the event and keeps the stream flowing. This module records those
//! skips so a session can be audited afterwards instead of the
//! anomalies disappearing silently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Category of warning for classification and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Cancel arrived for an order id the book does not know
    OrderNotFound,

    /// Add arrived for an order id that is already live
    DuplicateOrderId,

    /// Action character outside the recognized set
    UnknownAction,

    /// Add rejected for a zero/absent price or size
    RejectedAdd,

    /// Input record failed validation at the parser
    ValidationFailure,

    /// Book was cleared mid-session
    BookCleared,

    /// Other/uncategorized warning
    Other,
}

impl WarningCategory {
    /// Get a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::OrderNotFound => "ORDER_NOT_FOUND",
            WarningCategory::DuplicateOrderId => "DUPLICATE_ORDER_ID",
            WarningCategory::UnknownAction => "UNKNOWN_ACTION",
            WarningCategory::RejectedAdd => "REJECTED_ADD",
            WarningCategory::ValidationFailure => "VALIDATION_FAILURE",
            WarningCategory::BookCleared => "BOOK_CLEARED",
            WarningCategory::Other => "OTHER",
        }
    }

    /// Get severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::OrderNotFound => 1,
            WarningCategory::DuplicateOrderId => 2,
            WarningCategory::UnknownAction => 2,
            WarningCategory::RejectedAdd => 2,
            WarningCategory::ValidationFailure => 2,
            WarningCategory::BookCleared => 1,
            WarningCategory::Other => 1,
        }
    }
}

/// A single warning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Unique warning id (auto-incremented)
    pub id: u64,

    /// Warning category
    pub category: WarningCategory,

    /// Human-readable message
    pub message: String,

    /// Related order id (if applicable)
    pub order_id: Option<u64>,

    /// Related scaled price (if applicable)
    pub price: Option<u64>,

    /// Sequence number of the triggering event (if applicable)
    pub sequence: Option<u64>,
}

impl Warning {
    /// Create a new warning with minimal information.
    pub fn new(id: u64, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            id,
            category,
            message: message.into(),
            order_id: None,
            price: None,
            sequence: None,
        }
    }

    /// Set the order id.
    pub fn with_order_id(mut self, order_id: u64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Set the price.
    pub fn with_price(mut self, price: u64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// Summary statistics for warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Total number of warnings recorded
    pub total: u64,

    /// Count by category name
    pub by_category: HashMap<String, u64>,

    /// Count by severity
    pub by_severity: HashMap<u8, u64>,

    /// Number of unique order ids involved
    pub unique_orders: u64,
}

/// Warning tracker with capped storage.
///
/// Counts are exact even past the cap; only the stored detail records
/// are bounded.
#[derive(Debug)]
pub struct WarningTracker {
    /// Maximum number of detail records kept in memory
    max_warnings: usize,

    /// Stored warnings
    warnings: Vec<Warning>,

    /// Counter for unique ids
    next_id: u64,

    /// Count by category (exact, uncapped)
    category_counts: HashMap<WarningCategory, u64>,

    /// Unique order ids seen in warnings
    unique_orders: std::collections::HashSet<u64>,
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningTracker {
    /// Default cap on stored detail records.
    pub const DEFAULT_MAX_WARNINGS: usize = 100_000;

    /// Create a new warning tracker with the default cap.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_WARNINGS)
    }

    /// Create a new warning tracker with a custom cap.
    pub fn with_capacity(max_warnings: usize) -> Self {
        Self {
            max_warnings,
            warnings: Vec::new(),
            next_id: 1,
            category_counts: HashMap::new(),
            unique_orders: std::collections::HashSet::new(),
        }
    }

    /// Record a warning, returning its id.
    pub fn record(&mut self, category: WarningCategory, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.store(Warning::new(id, category, message))
    }

    /// Record a warning with order context.
    pub fn record_order(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
        order_id: u64,
        sequence: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.store(
            Warning::new(id, category, message)
                .with_order_id(order_id)
                .with_sequence(sequence),
        )
    }

    fn store(&mut self, warning: Warning) -> u64 {
        log::warn!("[{}] {}", warning.category.name(), warning.message);

        if let Some(order_id) = warning.order_id {
            self.unique_orders.insert(order_id);
        }
        *self.category_counts.entry(warning.category).or_insert(0) += 1;

        let id = warning.id;
        if self.warnings.len() < self.max_warnings {
            self.warnings.push(warning);
        }
        id
    }

    /// Number of detail records currently stored.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Check if no warnings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Total count, including records dropped past the cap.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    /// Count for a specific category.
    pub fn count_by_category(&self, category: WarningCategory) -> u64 {
        *self.category_counts.get(&category).unwrap_or(&0)
    }

    /// All stored warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Get summary statistics.
    pub fn summary(&self) -> WarningSummary {
        let mut by_category = HashMap::new();
        let mut by_severity = HashMap::new();

        for (cat, count) in &self.category_counts {
            by_category.insert(cat.name().to_string(), *count);
            *by_severity.entry(cat.severity()).or_insert(0) += *count;
        }

        WarningSummary {
            total: self.total_count(),
            by_category,
            by_severity,
            unique_orders: self.unique_orders.len() as u64,
        }
    }

    /// Export the summary and stored warnings to a JSON file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        #[derive(Serialize)]
        struct Export<'a> {
            summary: WarningSummary,
            warnings: &'a [Warning],
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(
            &mut writer,
            &Export {
                summary: self.summary(),
                warnings: &self.warnings,
            },
        )
        .map_err(std::io::Error::other)?;
        writer.flush()
    }

    /// Clear all warnings.
    pub fn clear(&mut self) {
        self.warnings.clear();
        self.category_counts.clear();
        self.unique_orders.clear();
    }
}
