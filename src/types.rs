//! Re-exported types from external crates for convenience.
//!
//! These types are commonly used in RTDS payloads and are re-exported here
//! so users don't need to add these dependencies to their `Cargo.toml`.

/// Date and time types for timestamps in RTDS payloads.
pub use chrono::{DateTime, Utc};
/// Arbitrary precision decimal type for prices and sizes.
pub use rust_decimal::Decimal;
/// Macro for creating [`Decimal`] literals at compile time.
///
/// # Example
/// ```
/// use polymarket_rtds_client::types::dec;
/// let price = dec!(0.55);
/// ```
pub use rust_decimal_macros::dec;
