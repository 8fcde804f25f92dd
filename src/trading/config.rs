//! Engine configuration: starting cash and per-strategy thresholds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::KnapsackItem;

/// Greedy one-step-ahead thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedyConfig {
    /// Buy when the next price exceeds the current one by more than this fraction
    pub entry_rise: Decimal,

    /// Sell once the position gains at least this fraction
    pub take_profit: Decimal,

    /// Sell once the position loses at least this fraction
    pub stop_loss: Decimal,

    /// Sell when the next price falls more than this fraction below the current one
    pub exit_drop: Decimal,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            entry_rise: dec!(0.015), // next > current * 1.015
            take_profit: dec!(0.03),
            stop_loss: dec!(0.02),
            exit_drop: dec!(0.02), // next < current * 0.98
        }
    }
}

/// Multi-tick lookahead thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookaheadConfig {
    /// Number of future prices inspected per tick
    pub window: usize,

    /// Minimum gain from current price to window maximum to enter
    pub min_peak_gain: Decimal,

    /// Window average must exceed current price by more than this fraction
    pub min_avg_gain: Decimal,

    /// Exit when current price reaches this fraction of the window maximum
    pub peak_proximity: Decimal,

    /// Exit when the window minimum is this far below the entry price
    pub downside_limit: Decimal,

    pub take_profit: Decimal,
}

impl Default for LookaheadConfig {
    fn default() -> Self {
        Self {
            window: 4,
            min_peak_gain: dec!(0.04),
            min_avg_gain: dec!(0.02),
            peak_proximity: dec!(0.95),
            downside_limit: dec!(0.03),
            take_profit: dec!(0.05),
        }
    }
}

/// Portfolio knapsack catalog and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnapsackConfig {
    /// Total risk weight the optimizer may allocate
    pub capacity: u32,

    pub catalog: Vec<KnapsackItem>,

    /// Enter only when the selected items average at least this value
    pub min_avg_value: Decimal,

    pub take_profit: Decimal,
}

impl Default for KnapsackConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            catalog: default_catalog(),
            min_avg_value: dec!(8),
            take_profit: dec!(0.04),
        }
    }
}

/// Largest knapsack capacity accepted by `EngineConfig::validate`.
pub const MAX_KNAPSACK_CAPACITY: u32 = 10_000;

/// The six-stock demo catalog as (stock, weight, value).
pub fn default_catalog() -> Vec<KnapsackItem> {
    vec![
        KnapsackItem::new("AAPL", 3, 8),
        KnapsackItem::new("GOOGL", 4, 9),
        KnapsackItem::new("MSFT", 2, 6),
        KnapsackItem::new("TSLA", 5, 12),
        KnapsackItem::new("NVDA", 4, 10),
        KnapsackItem::new("AMZN", 3, 7),
    ]
}

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cash a fresh run starts with
    pub initial_cash: Decimal,

    pub greedy: GreedyConfig,

    pub lookahead: LookaheadConfig,

    pub knapsack: KnapsackConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(10000),
            greedy: GreedyConfig::default(),
            lookahead: LookaheadConfig::default(),
            knapsack: KnapsackConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check the static configuration before any tick runs.
    pub fn validate(&self) -> Result<()> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(EngineError::InvalidInitialCash(self.initial_cash));
        }

        check_fraction("greedy.entry_rise", self.greedy.entry_rise)?;
        check_fraction("greedy.take_profit", self.greedy.take_profit)?;
        check_fraction("greedy.stop_loss", self.greedy.stop_loss)?;
        check_fraction("greedy.exit_drop", self.greedy.exit_drop)?;

        if self.lookahead.window == 0 {
            return Err(EngineError::ZeroLookahead);
        }
        check_fraction("lookahead.min_peak_gain", self.lookahead.min_peak_gain)?;
        check_fraction("lookahead.min_avg_gain", self.lookahead.min_avg_gain)?;
        check_fraction("lookahead.downside_limit", self.lookahead.downside_limit)?;
        check_fraction("lookahead.take_profit", self.lookahead.take_profit)?;
        if self.lookahead.peak_proximity <= Decimal::ZERO
            || self.lookahead.peak_proximity > Decimal::ONE
        {
            return Err(EngineError::InvalidThreshold {
                name: "lookahead.peak_proximity",
                value: self.lookahead.peak_proximity,
            });
        }

        if self.knapsack.capacity == 0 {
            return Err(EngineError::ZeroCapacity);
        }
        if self.knapsack.capacity > MAX_KNAPSACK_CAPACITY {
            return Err(EngineError::CapacityTooLarge {
                capacity: self.knapsack.capacity,
                max: MAX_KNAPSACK_CAPACITY,
            });
        }
        if self.knapsack.catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        if let Some(item) = self
            .knapsack
            .catalog
            .iter()
            .find(|i| i.weight == 0 || i.value == 0)
        {
            return Err(EngineError::InvalidItem {
                stock: item.stock.clone(),
                weight: item.weight,
                value: item.value,
            });
        }
        if self.knapsack.min_avg_value < Decimal::ZERO {
            return Err(EngineError::InvalidThreshold {
                name: "knapsack.min_avg_value",
                value: self.knapsack.min_avg_value,
            });
        }
        check_fraction("knapsack.take_profit", self.knapsack.take_profit)?;

        Ok(())
    }
}

/// Fractions must sit in [0, 1).
fn check_fraction(name: &'static str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(EngineError::InvalidThreshold { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_knapsack_setup() {
        let mut config = EngineConfig::default();
        config.knapsack.catalog.clear();
        assert_eq!(config.validate(), Err(EngineError::EmptyCatalog));

        let mut config = EngineConfig::default();
        config.knapsack.capacity = 0;
        assert_eq!(config.validate(), Err(EngineError::ZeroCapacity));

        let mut config = EngineConfig::default();
        config.knapsack.capacity = MAX_KNAPSACK_CAPACITY;
        assert!(config.validate().is_ok());
        config.knapsack.capacity = u32::MAX;
        assert_eq!(
            config.validate(),
            Err(EngineError::CapacityTooLarge {
                capacity: u32::MAX,
                max: MAX_KNAPSACK_CAPACITY
            })
        );

        let mut config = EngineConfig::default();
        config.knapsack.catalog.push(KnapsackItem::new("META", 0, 5));
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidItem { ref stock, .. }) if stock == "META"
        ));
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let mut config = EngineConfig::default();
        config.greedy.stop_loss = dec!(-0.02);
        assert_eq!(
            config.validate(),
            Err(EngineError::InvalidThreshold {
                name: "greedy.stop_loss",
                value: dec!(-0.02)
            })
        );

        let mut config = EngineConfig::default();
        config.lookahead.window = 0;
        assert_eq!(config.validate(), Err(EngineError::ZeroLookahead));

        let mut config = EngineConfig::default();
        config.initial_cash = Decimal::ZERO;
        assert_eq!(
            config.validate(),
            Err(EngineError::InvalidInitialCash(Decimal::ZERO))
        );
    }
}
