//! Order book reconstruction: price levels, the two-sided book, and
//! the event-driven MBP-10 driver.

pub mod order_book;
pub mod price_level;
pub mod reconstructor;

pub use order_book::{OrderBook, OrderRef};
pub use price_level::PriceLevel;
pub use reconstructor::{ReconStats, Reconstructor};
