//! Data models for price series, portfolio state, step records and knapsack snapshots.

mod knapsack;
mod portfolio;
mod series;
mod step;

pub use knapsack::{KnapsackItem, KnapsackSelection, KnapsackSnapshot};
pub use portfolio::PortfolioState;
pub use series::PriceSeries;
pub use step::{Decision, Rule, StepRecord};
