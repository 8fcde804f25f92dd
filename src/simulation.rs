//! Simulation session: one strategy run over one price series.
//!
//! The session owns the portfolio state and the append-only step log, and is
//! the only place the engine is driven from. Selecting a different strategy
//! discards the run and starts over from the initial cash.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::models::{Decision, PortfolioState, PriceSeries, StepRecord};
use crate::trading::{StrategyEngine, StrategyKind};

/// A single strategy run.
pub struct Simulation {
    engine: StrategyEngine,
    series: PriceSeries,
    strategy: StrategyKind,
    initial_cash: Decimal,
    state: PortfolioState,
    steps: Vec<StepRecord>,
}

impl Simulation {
    /// Start a run at index 0 with the engine's configured initial cash.
    pub fn new(engine: StrategyEngine, series: PriceSeries, strategy: StrategyKind) -> Self {
        let initial_cash = engine.config().initial_cash;
        let state = engine.reset(initial_cash);

        Self {
            engine,
            series,
            strategy,
            initial_cash,
            state,
            steps: Vec::new(),
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    /// Switch strategy. The previous run is discarded in full.
    pub fn select_strategy(&mut self, strategy: StrategyKind) {
        info!(from = %self.strategy, to = %strategy, "Strategy switched, resetting run");
        self.strategy = strategy;
        self.reset();
    }

    /// Back to index 0 with the initial cash and an empty log.
    pub fn reset(&mut self) {
        self.state = self.engine.reset(self.initial_cash);
        self.steps.clear();
    }

    pub fn is_finished(&self) -> bool {
        self.state.current_index >= self.series.last_index()
    }

    /// Advance one tick. Returns `None` once the series is exhausted.
    pub fn step(&mut self) -> Option<&StepRecord> {
        if self.is_finished() {
            return None;
        }

        let (next, record) = self.engine.advance(&self.state, &self.series, self.strategy);
        self.state = next;
        self.steps.push(record);
        self.steps.last()
    }

    /// Advance until the series is exhausted.
    pub fn run_to_end(&mut self) -> &[StepRecord] {
        while self.step().is_some() {}
        &self.steps
    }

    /// Price at the cursor.
    pub fn current_price(&self) -> Decimal {
        self.series
            .get(self.state.current_index)
            .unwrap_or_else(|| self.series.last())
    }

    /// Cash plus shares marked at the current price.
    pub fn portfolio_value(&self) -> Decimal {
        self.state.market_value(self.current_price())
    }

    pub fn total_realized(&self) -> Decimal {
        self.steps.iter().map(|s| s.realized_profit).sum()
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.state.unrealized_pnl(self.current_price())
    }

    /// Return on initial cash as a fraction.
    pub fn total_return_pct(&self) -> Decimal {
        (self.portfolio_value() - self.initial_cash) / self.initial_cash
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            strategy: self.strategy,
            step: self.state.current_index,
            total_ticks: self.series.last_index(),
            initial_cash: self.initial_cash,
            cash: self.state.cash,
            shares: self.state.position_shares,
            portfolio_value: self.portfolio_value(),
            realized_pnl: self.total_realized(),
            unrealized_pnl: self.unrealized_pnl(),
            return_pct: self.total_return_pct(),
            round_trips: self
                .steps
                .iter()
                .filter(|s| s.decision == Decision::Sell)
                .count(),
            finished: self.is_finished(),
        }
    }
}

/// Point-in-time view of a run.
#[derive(Debug, Clone)]
pub struct SimulationStats {
    pub strategy: StrategyKind,
    pub step: usize,
    pub total_ticks: usize,
    pub initial_cash: Decimal,
    pub cash: Decimal,
    pub shares: u64,
    pub portfolio_value: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub return_pct: Decimal,
    pub round_trips: usize,
    pub finished: bool,
}

impl std::fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^50}", format!(" {} ", self.strategy.name().to_uppercase()))?;
        writeln!(f, "Complexity:       {}", self.strategy.complexity())?;
        writeln!(
            f,
            "Step:             {}/{}{}",
            self.step,
            self.total_ticks,
            if self.finished { " (finished)" } else { "" }
        )?;
        writeln!(f)?;
        writeln!(f, "Initial Cash:     ${:.2}", self.initial_cash)?;
        writeln!(f, "Cash:             ${:.2}", self.cash)?;
        writeln!(f, "Shares:           {}", self.shares)?;
        writeln!(f, "Portfolio Value:  ${:.2}", self.portfolio_value)?;
        writeln!(f)?;
        writeln!(f, "Realized P&L:     ${:.2}", self.realized_pnl)?;
        writeln!(f, "Unrealized P&L:   ${:.2}", self.unrealized_pnl)?;
        writeln!(f, "Total Return:     {:.1}%", self.return_pct * dec!(100))?;
        writeln!(f, "Round Trips:      {}", self.round_trips)?;
        writeln!(f, "{:=^50}", "")?;
        Ok(())
    }
}
