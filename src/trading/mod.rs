//! Trading logic: decision rules, knapsack solver and the step engine.

mod config;
mod engine;
mod knapsack;
mod strategy;

pub use config::{EngineConfig, KnapsackConfig};
pub use engine::StrategyEngine;
pub use strategy::StrategyKind;
