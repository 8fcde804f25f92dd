//! Run metrics computed from a step log.

mod calculator;

pub use calculator::MetricsCalculator;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::StepRecord;

/// Summary statistics of one strategy run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    // === Activity ===
    /// Ticks evaluated
    pub ticks: usize,

    /// BUY decisions
    pub buys: u32,

    /// SELL decisions, one per completed round trip
    pub sells: u32,

    // === Win/Loss ===
    pub winning_trades: u32,
    pub losing_trades: u32,

    /// Win rate over completed round trips (0.0 to 1.0)
    pub win_rate: f64,

    pub total_realized: Decimal,

    pub avg_win: Decimal,

    /// Average loss (absolute value)
    pub avg_loss: Decimal,

    /// Gross profit / gross loss, 0 when there were no losses
    pub profit_factor: f64,

    // === Risk ===
    /// Largest peak-to-trough fall of the equity curve (0.0 to 1.0)
    pub max_drawdown: f64,

    pub max_drawdown_abs: Decimal,

    pub peak_equity: Decimal,

    pub final_equity: Decimal,

    /// Mean of per-tick equity returns
    pub mean_tick_return: f64,

    /// Standard deviation of per-tick equity returns
    pub tick_volatility: f64,
}

impl RunMetrics {
    pub fn from_steps(steps: &[StepRecord], initial_cash: Decimal) -> Self {
        MetricsCalculator::calculate(steps, initial_cash)
    }

    /// Round trips closed.
    pub fn round_trips(&self) -> u32 {
        self.winning_trades + self.losing_trades
    }
}

impl std::fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^50}", " RUN METRICS ")?;
        writeln!(f, "Ticks:            {}", self.ticks)?;
        writeln!(f, "Buys / Sells:     {} / {}", self.buys, self.sells)?;
        writeln!(f)?;
        writeln!(f, "Round Trips:      {}", self.round_trips())?;
        writeln!(f, "Winning Trades:   {}", self.winning_trades)?;
        writeln!(f, "Losing Trades:    {}", self.losing_trades)?;
        writeln!(f, "Win Rate:         {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Realized P&L:     ${:.2}", self.total_realized)?;
        writeln!(f, "Avg Win:          ${:.2}", self.avg_win)?;
        writeln!(f, "Avg Loss:         ${:.2}", self.avg_loss)?;
        if self.losing_trades > 0 {
            writeln!(f, "Profit Factor:    {:.2}", self.profit_factor)?;
        } else {
            writeln!(f, "Profit Factor:    n/a")?;
        }
        writeln!(f)?;
        writeln!(f, "Max Drawdown:     {:.2}% (${:.2})", self.max_drawdown * 100.0, self.max_drawdown_abs)?;
        writeln!(f, "Peak Equity:      ${:.2}", self.peak_equity)?;
        writeln!(f, "Final Equity:     ${:.2}", self.final_equity)?;
        writeln!(f, "Tick Return:      {:.3}% (vol {:.3}%)", self.mean_tick_return * 100.0, self.tick_volatility * 100.0)?;
        writeln!(f, "{:=^50}", "")?;
        Ok(())
    }
}
