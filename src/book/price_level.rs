//! Price level with cached aggregate size.
//!
//! A `PriceLevel` aggregates every resting order that shares one
//! (side, scaled price) pair: the individual order sizes plus a cached
//! total for O(1) aggregate queries.
//!
//! # Invariant
//!
//! `total_size` MUST always equal `orders.values().sum()`, and an empty
//! level never rests inside the book's side maps (the book erases it as
//! soon as the last order leaves). The invariant is enforced through
//! encapsulated mutation methods and verified in debug builds.
//!
//! # Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `add_order` | O(1) amortized |
//! | `remove_order` | O(1) amortized |
//! | `total_size` | O(1) |
//! | `order_count` | O(1) |

use ahash::AHashMap;

/// A price level in the order book with cached aggregate size.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    /// Resting orders at this price: order_id → size
    orders: AHashMap<u64, u32>,
    /// Cached total size (invariant: == orders.values().sum())
    total_size: u64,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order to this level.
    ///
    /// Callers guarantee the id is not already resident (the book's
    /// order index gates duplicates before they get here). If an id is
    /// nevertheless replayed, the stale size is backed out first so the
    /// cached total stays truthful.
    #[inline]
    pub fn add_order(&mut self, order_id: u64, size: u32) {
        if let Some(old) = self.orders.insert(order_id, size) {
            self.total_size -= u64::from(old);
        }
        self.total_size += u64::from(size);

        #[cfg(debug_assertions)]
        self.verify_invariant();
    }

    /// Remove an order from this level.
    ///
    /// Returns the removed size, or `None` if the id was not resident
    /// (an idempotent miss, not an error).
    #[inline]
    pub fn remove_order(&mut self, order_id: u64) -> Option<u32> {
        let size = self.orders.remove(&order_id)?;
        self.total_size -= u64::from(size);

        #[cfg(debug_assertions)]
        self.verify_invariant();

        Some(size)
    }

    /// Get the cached total resting size (O(1)).
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Get the number of resting orders.
    #[inline]
    pub fn order_count(&self) -> u32 {
        self.orders.len() as u32
    }

    /// Check if the level has no orders.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Check if an order is resident at this level.
    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Iterate over resident (order_id, size) pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &u32)> {
        self.orders.iter()
    }

    /// Compute the actual total by summing all orders (O(n)).
    #[inline]
    pub fn compute_actual_total(&self) -> u64 {
        self.orders.values().map(|&v| u64::from(v)).sum()
    }

    /// Verify the size invariant holds.
    #[cfg(debug_assertions)]
    #[inline]
    pub fn verify_invariant(&self) {
        debug_assert_eq!(
            self.compute_actual_total(),
            self.total_size,
            "PriceLevel invariant violated: actual={}, cached={}",
            self.compute_actual_total(),
            self.total_size
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn verify_invariant(&self) {}
}
