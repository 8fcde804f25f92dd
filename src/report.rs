//! JSON run report for downstream renderers and exporters.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::metrics::RunMetrics;
use crate::models::{PortfolioState, PriceSeries, StepRecord};
use crate::simulation::Simulation;
use crate::trading::{EngineConfig, StrategyKind};

/// Everything needed to re-render a finished (or stopped) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: StrategyKind,
    pub strategy_name: &'static str,
    pub complexity: &'static str,
    pub generated_at: DateTime<Utc>,
    pub config: EngineConfig,
    pub series: PriceSeries,
    pub initial_cash: Decimal,
    pub final_state: PortfolioState,
    pub portfolio_value: Decimal,
    pub total_return_pct: Decimal,
    pub metrics: RunMetrics,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn from_simulation(sim: &Simulation) -> Self {
        let strategy = sim.strategy();

        Self {
            strategy,
            strategy_name: strategy.name(),
            complexity: strategy.complexity(),
            generated_at: Utc::now(),
            config: sim.engine().config().clone(),
            series: sim.series().clone(),
            initial_cash: sim.initial_cash(),
            final_state: sim.state().clone(),
            portfolio_value: sim.portfolio_value(),
            total_return_pct: sim.total_return_pct(),
            metrics: RunMetrics::from_steps(sim.steps(), sim.initial_cash()),
            steps: sim.steps().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        info!(path = %path.display(), steps = self.steps.len(), "Report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::demo_series;
    use crate::trading::StrategyEngine;

    #[test]
    fn test_report_json_shape() {
        let mut sim = Simulation::new(StrategyEngine::default(), demo_series(), StrategyKind::Knapsack);
        sim.run_to_end();

        let report = RunReport::from_simulation(&sim);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["strategy"], "knapsack");
        assert_eq!(json["strategy_name"], "Portfolio Knapsack");
        assert_eq!(json["series"].as_array().unwrap().len(), 24);
        assert_eq!(json["steps"].as_array().unwrap().len(), 23);
        assert_eq!(json["steps"][0]["decision"], "BUY");
        assert_eq!(json["steps"][0]["knapsack"]["total_value"], 26);
        assert_eq!(json["portfolio_value"], sim.portfolio_value().to_string());
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn test_greedy_steps_omit_knapsack() {
        let mut sim = Simulation::new(StrategyEngine::default(), demo_series(), StrategyKind::Greedy);
        sim.step();

        let report = RunReport::from_simulation(&sim);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["strategy"], "greedy");
        assert!(json["steps"][0].get("knapsack").is_none());
        assert_eq!(json["steps"][0]["rule"], "no_entry_signal");
    }

    #[test]
    fn test_write_to_file() {
        let mut sim = Simulation::new(StrategyEngine::default(), demo_series(), StrategyKind::Lookahead);
        sim.run_to_end();

        let path = std::env::temp_dir().join(format!("stratviz-report-{}.json", std::process::id()));
        RunReport::from_simulation(&sim).write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(written.contains("\"strategy\": \"dp\""));
    }
}
