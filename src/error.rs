//! Configuration errors raised when building an engine, catalog or price series.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors for invalid static configuration. Nothing at tick level produces one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A price series needs at least one sample.
    #[error("Price series is empty")]
    EmptySeries,

    /// Every price must be strictly positive.
    #[error("Price at index {index} must be positive, got {price}")]
    NonPositivePrice { index: usize, price: Decimal },

    /// The knapsack strategy has nothing to choose from.
    #[error("Knapsack catalog is empty")]
    EmptyCatalog,

    /// Catalog items need a positive weight and value.
    #[error("Knapsack item {stock} must have positive weight and value (weight {weight}, value {value})")]
    InvalidItem { stock: String, weight: u32, value: u32 },

    #[error("Knapsack capacity must be positive")]
    ZeroCapacity,

    /// The solver table grows with capacity on every tick.
    #[error("Knapsack capacity {capacity} exceeds the maximum of {max}")]
    CapacityTooLarge { capacity: u32, max: u32 },

    #[error("Lookahead window must cover at least one price")]
    ZeroLookahead,

    #[error("Initial cash must be positive, got {0}")]
    InvalidInitialCash(Decimal),

    /// A fractional threshold outside its allowed range.
    #[error("Threshold {name} out of range: {value}")]
    InvalidThreshold { name: &'static str, value: Decimal },

    #[error("Unknown strategy '{0}' (expected greedy, dp or knapsack)")]
    UnknownStrategy(String),
}

/// A specialized Result type for engine configuration.
pub type Result<T> = std::result::Result<T, EngineError>;
