//! Per-tick decision rules for the three strategies.
//!
//! Each rule is a pure function of the portfolio state and the visible price
//! window. Rules only decide; share sizing and cash bookkeeping happen in the
//! engine.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::config::{GreedyConfig, KnapsackConfig, LookaheadConfig};
use crate::error::EngineError;
use crate::models::{KnapsackSnapshot, PortfolioState, Rule};

/// Strategy selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// One-step-ahead threshold rule
    #[serde(rename = "greedy")]
    Greedy,
    /// Multi-tick lookahead rule
    #[serde(rename = "dp")]
    Lookahead,
    /// Knapsack portfolio optimizer
    #[serde(rename = "knapsack")]
    Knapsack,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Greedy,
        StrategyKind::Lookahead,
        StrategyKind::Knapsack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Greedy => "greedy",
            StrategyKind::Lookahead => "dp",
            StrategyKind::Knapsack => "knapsack",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Greedy => "Greedy Strategy",
            StrategyKind::Lookahead => "Dynamic Programming",
            StrategyKind::Knapsack => "Portfolio Knapsack",
        }
    }

    /// Per-run time complexity label.
    pub fn complexity(&self) -> &'static str {
        match self {
            StrategyKind::Greedy | StrategyKind::Lookahead => "O(n)",
            StrategyKind::Knapsack => "O(nW)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::Greedy => {
                "Makes locally optimal choices - buy low, sell high immediately"
            }
            StrategyKind::Lookahead => {
                "Looks several ticks ahead and trades near the window optimum"
            }
            StrategyKind::Knapsack => {
                "Optimizes portfolio allocation using the 0/1 knapsack algorithm"
            }
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "dp" | "lookahead" | "dynamic" => Ok(Self::Lookahead),
            "knapsack" | "portfolio" => Ok(Self::Knapsack),
            other => Err(EngineError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Prices visible to a rule on one tick.
#[derive(Debug, Clone, Copy)]
pub struct PriceWindow<'a> {
    pub current: Decimal,
    /// Prices after `current`, bounded by the lookahead window
    pub ahead: &'a [Decimal],
}

impl<'a> PriceWindow<'a> {
    pub fn new(current: Decimal, ahead: &'a [Decimal]) -> Self {
        Self { current, ahead }
    }

    /// Next price, or the current one at the end of the series.
    pub fn next(&self) -> Decimal {
        self.ahead.first().copied().unwrap_or(self.current)
    }

    pub fn future_max(&self) -> Decimal {
        self.ahead.iter().copied().max().unwrap_or(self.current)
    }

    pub fn future_min(&self) -> Decimal {
        self.ahead.iter().copied().min().unwrap_or(self.current)
    }

    pub fn future_avg(&self) -> Decimal {
        if self.ahead.is_empty() {
            return self.current;
        }
        self.ahead.iter().copied().sum::<Decimal>() / Decimal::from(self.ahead.len() as u64)
    }
}

/// What a rule wants to do with the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Enter,
    Exit,
    Stay,
}

/// Output of a decision rule.
#[derive(Debug, Clone)]
pub struct Signal {
    pub action: Action,
    pub rule: Rule,
    pub reasoning: String,
}

impl Signal {
    fn enter(reasoning: String) -> Self {
        Self {
            action: Action::Enter,
            rule: Rule::Entry,
            reasoning,
        }
    }

    fn exit(rule: Rule, reasoning: String) -> Self {
        Self {
            action: Action::Exit,
            rule,
            reasoning,
        }
    }

    fn stay(rule: Rule, reasoning: String) -> Self {
        Self {
            action: Action::Stay,
            rule,
            reasoning,
        }
    }
}

fn pct(fraction: Decimal) -> Decimal {
    (fraction * dec!(100)).round_dp(1)
}

/// Greedy rule: looks one price ahead.
pub fn greedy(state: &PortfolioState, window: &PriceWindow<'_>, config: &GreedyConfig) -> Signal {
    let current = window.current;
    let next = window.next();

    if state.is_flat() {
        if next > current * (Decimal::ONE + config.entry_rise) {
            return Signal::enter(format!(
                "Greedy: buy signal - next price {:.2} > current {:.2} (+{}%)",
                next,
                current,
                pct(next / current - Decimal::ONE)
            ));
        }
        return Signal::stay(
            Rule::NoEntrySignal,
            format!("Greedy: wait - next price {:.2} not profitable enough", next),
        );
    }

    let pnl = state.return_pct(current);
    if pnl >= config.take_profit {
        return Signal::exit(
            Rule::TakeProfit,
            format!("Greedy: take profit - {}% gain", pct(pnl)),
        );
    }
    if pnl <= -config.stop_loss {
        return Signal::exit(
            Rule::StopLoss,
            format!("Greedy: stop loss - {}% loss", pct(pnl)),
        );
    }
    if next < current * (Decimal::ONE - config.exit_drop) {
        return Signal::exit(
            Rule::PreemptiveExit,
            format!(
                "Greedy: exit before drop - next price {:.2} < current {:.2}",
                next, current
            ),
        );
    }

    Signal::stay(
        Rule::HoldPosition,
        format!(
            "Greedy: hold {} shares - unrealized P&L {:.2}",
            state.position_shares,
            state.unrealized_pnl(current)
        ),
    )
}

/// Lookahead rule: inspects the whole window of future prices.
pub fn lookahead(
    state: &PortfolioState,
    window: &PriceWindow<'_>,
    config: &LookaheadConfig,
) -> Signal {
    let current = window.current;
    let future_max = window.future_max();
    let future_min = window.future_min();
    let future_avg = window.future_avg();

    if state.is_flat() {
        let peak_gain = (future_max - current) / current;
        if peak_gain >= config.min_peak_gain
            && future_avg > current * (Decimal::ONE + config.min_avg_gain)
        {
            return Signal::enter(format!(
                "DP: optimal buy - future max {:.2} (+{}%), avg {:.2}",
                future_max,
                pct(peak_gain),
                future_avg
            ));
        }
        return Signal::stay(
            Rule::NoEntrySignal,
            format!(
                "DP: wait - max future gain {}% insufficient (need {}%+)",
                pct(peak_gain),
                pct(config.min_peak_gain)
            ),
        );
    }

    if current >= future_max * config.peak_proximity {
        return Signal::exit(
            Rule::NearLookaheadPeak,
            format!(
                "DP: optimal exit - current {:.2} near future max {:.2}",
                current, future_max
            ),
        );
    }
    let downside = state.return_pct(future_min);
    if downside <= -config.downside_limit {
        return Signal::exit(
            Rule::DownsideRisk,
            format!(
                "DP: risk exit - future min {:.2} shows {}% loss",
                future_min,
                pct(downside)
            ),
        );
    }
    let gain = state.return_pct(current);
    if gain >= config.take_profit {
        return Signal::exit(
            Rule::TakeProfit,
            format!("DP: profit target - {}% gain achieved", pct(gain)),
        );
    }

    Signal::stay(
        Rule::HoldPosition,
        format!(
            "DP: hold - current gain {}%, future max {}%",
            pct(gain),
            pct(state.return_pct(future_max))
        ),
    )
}

/// Knapsack rule: enters when the optimal selection is strong enough.
pub fn knapsack(
    state: &PortfolioState,
    window: &PriceWindow<'_>,
    snapshot: &KnapsackSnapshot,
    config: &KnapsackConfig,
) -> Signal {
    if state.is_flat() {
        let avg_value = snapshot.average_selected_value();
        if avg_value >= config.min_avg_value {
            return Signal::enter(format!(
                "Knapsack: selected {} (value {}, weight {}/{}), avg value {:.2}",
                snapshot.selected_stocks().join("+"),
                snapshot.total_value,
                snapshot.total_weight,
                snapshot.capacity,
                avg_value
            ));
        }
        return Signal::stay(
            Rule::LowPortfolioValue,
            format!(
                "Knapsack: wait - avg selected value {:.2} below {}",
                avg_value, config.min_avg_value
            ),
        );
    }

    let gain = state.return_pct(window.current);
    if gain >= config.take_profit {
        return Signal::exit(
            Rule::TakeProfit,
            format!("Knapsack: rebalance - {}% gain", pct(gain)),
        );
    }

    Signal::stay(
        Rule::HoldPosition,
        format!("Knapsack: hold - current gain {}%", pct(gain)),
    )
}
