//! One auditable entry of the decision log.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::KnapsackSnapshot;

/// What the engine did on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule branch that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Entry condition met and at least one share affordable
    Entry,
    /// Flat and the entry condition was not met
    NoEntrySignal,
    /// Entry condition met but cash buys zero shares
    InsufficientCash,
    /// Knapsack selection too weak to enter
    LowPortfolioValue,
    TakeProfit,
    StopLoss,
    /// Greedy exit ahead of a forecast drop
    PreemptiveExit,
    /// Lookahead exit near the window maximum
    NearLookaheadPeak,
    /// Lookahead exit because the window minimum breaches the loss limit
    DownsideRisk,
    HoldPosition,
    /// Cursor already at the end of the series
    SeriesExhausted,
}

/// Immutable result of a single `advance` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Series index the decision was taken at
    pub index: usize,

    /// Price at `index`
    pub price: Decimal,

    pub decision: Decision,

    /// Profit booked on this tick, zero unless `decision` is SELL
    pub realized_profit: Decimal,

    /// Human-readable explanation of the branch taken
    pub reasoning: String,

    pub rule: Rule,

    /// Shares held after the tick
    pub resulting_position: u64,

    /// Cash after the tick
    pub resulting_cash: Decimal,

    /// Knapsack solution computed for this tick, knapsack strategy only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knapsack: Option<KnapsackSnapshot>,
}

impl StepRecord {
    /// Cash plus position marked at the tick price.
    pub fn equity(&self) -> Decimal {
        self.resulting_cash + Decimal::from(self.resulting_position) * self.price
    }

    pub fn is_trade(&self) -> bool {
        self.decision != Decision::Hold
    }
}
