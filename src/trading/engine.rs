//! The step engine: applies one decision rule per tick and books the result.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::knapsack::solve_knapsack;
use super::strategy::{self, Action, PriceWindow, StrategyKind};
use crate::error::Result;
use crate::models::{Decision, KnapsackSnapshot, PortfolioState, PriceSeries, Rule, StepRecord};

/// Stateless engine holding validated configuration.
///
/// All run state lives in the [`PortfolioState`] passed to [`advance`](Self::advance),
/// so one engine can drive any number of independent runs.
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    config: EngineConfig,
}

impl Default for StrategyEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl StrategyEngine {
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh state for a new run.
    pub fn reset(&self, initial_cash: Decimal) -> PortfolioState {
        PortfolioState::new(initial_cash)
    }

    /// Solve the configured knapsack catalog.
    pub fn solve_knapsack(&self) -> KnapsackSnapshot {
        solve_knapsack(&self.config.knapsack.catalog, self.config.knapsack.capacity)
    }

    /// Consume the price at `state.current_index` and decide for `kind`.
    ///
    /// Once the cursor reaches the last price the call is a no-op: the state
    /// comes back unchanged with a HOLD record.
    pub fn advance(
        &self,
        state: &PortfolioState,
        series: &PriceSeries,
        kind: StrategyKind,
    ) -> (PortfolioState, StepRecord) {
        let index = state.current_index;

        if index >= series.last_index() {
            let price = series.get(index).unwrap_or_else(|| series.last());
            debug!(index, strategy = %kind, "Series exhausted, nothing to advance");
            let record = StepRecord {
                index,
                price,
                decision: Decision::Hold,
                realized_profit: Decimal::ZERO,
                reasoning: "Series exhausted - no further ticks".to_string(),
                rule: Rule::SeriesExhausted,
                resulting_position: state.position_shares,
                resulting_cash: state.cash,
                knapsack: None,
            };
            return (state.clone(), record);
        }

        let current = series[index];
        let window = PriceWindow::new(
            current,
            series.lookahead(index, self.config.lookahead.window),
        );

        let mut snapshot = None;
        let signal = match kind {
            StrategyKind::Greedy => strategy::greedy(state, &window, &self.config.greedy),
            StrategyKind::Lookahead => strategy::lookahead(state, &window, &self.config.lookahead),
            StrategyKind::Knapsack => {
                let solved = self.solve_knapsack();
                let signal = strategy::knapsack(state, &window, &solved, &self.config.knapsack);
                snapshot = Some(solved);
                signal
            }
        };

        let mut next = state.clone();
        next.current_index = index + 1;

        let (decision, realized_profit, rule, reasoning) = match signal.action {
            Action::Enter => {
                let shares = affordable_shares(state.cash, current);
                if shares == 0 {
                    (
                        Decision::Hold,
                        Decimal::ZERO,
                        Rule::InsufficientCash,
                        format!(
                            "{} - but cash {:.2} buys no share at {:.2}",
                            signal.reasoning, state.cash, current
                        ),
                    )
                } else {
                    next.cash -= Decimal::from(shares) * current;
                    next.position_shares = shares;
                    next.buy_price = current;
                    info!(
                        index,
                        strategy = %kind,
                        price = %current,
                        shares,
                        cash = %next.cash,
                        "Opened position"
                    );
                    (Decision::Buy, Decimal::ZERO, signal.rule, signal.reasoning)
                }
            }
            Action::Exit => {
                let shares = Decimal::from(state.position_shares);
                let realized = shares * (current - state.buy_price);
                next.cash += shares * current;
                next.position_shares = 0;
                next.buy_price = Decimal::ZERO;

                if signal.rule == Rule::StopLoss {
                    warn!(index, strategy = %kind, price = %current, pnl = %realized, "Stop loss triggered");
                } else {
                    info!(
                        index,
                        strategy = %kind,
                        price = %current,
                        pnl = %realized,
                        rule = ?signal.rule,
                        "Closed position"
                    );
                }
                (Decision::Sell, realized, signal.rule, signal.reasoning)
            }
            Action::Stay => (Decision::Hold, Decimal::ZERO, signal.rule, signal.reasoning),
        };

        debug!(index, strategy = %kind, decision = %decision, rule = ?rule, "Tick evaluated");

        let record = StepRecord {
            index,
            price: current,
            decision,
            realized_profit,
            reasoning,
            rule,
            resulting_position: next.position_shares,
            resulting_cash: next.cash,
            knapsack: snapshot,
        };

        (next, record)
    }
}

/// Whole shares `cash` buys at `price`, saturating at `u64::MAX`.
///
/// A quotient too large for `Decimal` or for `u64` still buys shares; only a
/// floor of zero means the cash is insufficient.
fn affordable_shares(cash: Decimal, price: Decimal) -> u64 {
    match cash.checked_div(price) {
        Some(quotient) => quotient.floor().to_u64().unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::feed::{demo_series, PriceFeed};
    use rust_decimal_macros::dec;

    fn run_all(
        engine: &StrategyEngine,
        series: &PriceSeries,
        kind: StrategyKind,
    ) -> (PortfolioState, Vec<StepRecord>) {
        let mut state = engine.reset(engine.config().initial_cash);
        let mut steps = Vec::new();
        while state.current_index < series.last_index() {
            let (next, record) = engine.advance(&state, series, kind);
            state = next;
            steps.push(record);
        }
        (state, steps)
    }

    fn trades(steps: &[StepRecord]) -> Vec<(usize, Decision, u64, Decimal)> {
        steps
            .iter()
            .filter(|s| s.is_trade())
            .map(|s| (s.index, s.decision, s.resulting_position, s.resulting_cash))
            .collect()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.knapsack.catalog.clear();

        assert_eq!(
            StrategyEngine::new(config).unwrap_err(),
            EngineError::EmptyCatalog
        );
    }

    #[test]
    fn test_greedy_first_buy_on_demo_series() {
        let engine = StrategyEngine::default();
        let series = demo_series();
        let state = engine.reset(dec!(10000));

        // 148 <= 150 * 1.015, so index 0 waits
        let (state, first) = engine.advance(&state, &series, StrategyKind::Greedy);
        assert_eq!(first.decision, Decision::Hold);
        assert_eq!(first.rule, Rule::NoEntrySignal);

        // 155 > 148 * 1.015: buy floor(10000 / 148) = 67 shares
        let (state, second) = engine.advance(&state, &series, StrategyKind::Greedy);
        assert_eq!(second.index, 1);
        assert_eq!(second.price, dec!(148));
        assert_eq!(second.decision, Decision::Buy);
        assert_eq!(second.resulting_position, 67);
        assert_eq!(second.resulting_cash, dec!(84));
        assert_eq!(state.buy_price, dec!(148));
        assert_eq!(state.current_index, 2);

        // +4.7% at 155 takes profit
        let (state, third) = engine.advance(&state, &series, StrategyKind::Greedy);
        assert_eq!(third.decision, Decision::Sell);
        assert_eq!(third.rule, Rule::TakeProfit);
        assert_eq!(third.realized_profit, dec!(469));
        assert_eq!(state.cash, dec!(10469));
        assert!(state.is_flat());
    }

    #[test]
    fn test_greedy_full_run_on_demo_series() {
        let engine = StrategyEngine::default();
        let (state, steps) = run_all(&engine, &demo_series(), StrategyKind::Greedy);

        assert_eq!(steps.len(), 23);
        let trades = trades(&steps);
        assert_eq!(trades.len(), 22);
        assert_eq!(trades[2], (3, Decision::Buy, 70, dec!(39)));
        assert_eq!(trades[21], (22, Decision::Sell, 0, dec!(20540)));
        assert_eq!(state.cash, dec!(20540));
        assert!(state.is_flat());
    }

    #[test]
    fn test_lookahead_full_run_on_demo_series() {
        let engine = StrategyEngine::default();
        let (state, steps) = run_all(&engine, &demo_series(), StrategyKind::Lookahead);

        let trades = trades(&steps);
        // Window max 162 is +8% and average 153.5 > 153
        assert_eq!(trades[0], (0, Decision::Buy, 66, dec!(100)));
        // 162 is +8% on entry, still short of 175 * 0.95
        assert_eq!(trades[1], (4, Decision::Sell, 0, dec!(10792)));
        assert_eq!(steps[4].rule, Rule::TakeProfit);
        assert_eq!(steps[4].realized_profit, dec!(792));
        assert_eq!(trades.len(), 20);
        assert_eq!(state.cash, dec!(19492));
    }

    #[test]
    fn test_knapsack_steps_carry_snapshot() {
        let engine = StrategyEngine::default();
        let (state, steps) = run_all(&engine, &demo_series(), StrategyKind::Knapsack);

        for step in &steps {
            let snapshot = step.knapsack.as_ref().expect("knapsack snapshot");
            assert_eq!(snapshot.total_value, 26);
            assert_eq!(snapshot.total_weight, 10);
        }
        assert_eq!(steps[0].decision, Decision::Buy);
        assert_eq!(steps[0].resulting_position, 66);
        assert_eq!(steps[4].decision, Decision::Sell);
        assert_eq!(state.cash, dec!(19492));

        let (_, greedy_steps) = run_all(&engine, &demo_series(), StrategyKind::Greedy);
        assert!(greedy_steps.iter().all(|s| s.knapsack.is_none()));
    }

    #[test]
    fn test_advance_after_end_is_noop() {
        let engine = StrategyEngine::default();
        let series = demo_series();
        let (state, _) = run_all(&engine, &series, StrategyKind::Greedy);

        let (again, record) = engine.advance(&state, &series, StrategyKind::Greedy);
        assert_eq!(again, state);
        assert_eq!(record.decision, Decision::Hold);
        assert_eq!(record.rule, Rule::SeriesExhausted);
        assert_eq!(record.realized_profit, Decimal::ZERO);
        assert_eq!(record.price, dec!(203));

        let (twice, _) = engine.advance(&again, &series, StrategyKind::Greedy);
        assert_eq!(twice, state);
    }

    #[test]
    fn test_single_price_series_is_already_finished() {
        let engine = StrategyEngine::default();
        let series = PriceSeries::from_whole(&[100]).unwrap();
        let state = engine.reset(dec!(500));

        let (next, record) = engine.advance(&state, &series, StrategyKind::Lookahead);
        assert_eq!(next, state);
        assert_eq!(record.rule, Rule::SeriesExhausted);
    }

    #[test]
    fn test_insufficient_cash_degrades_to_hold() {
        let engine = StrategyEngine::default();
        let series = PriceSeries::from_whole(&[148, 155, 160]).unwrap();
        let state = engine.reset(dec!(100));

        let (next, record) = engine.advance(&state, &series, StrategyKind::Greedy);
        assert_eq!(record.decision, Decision::Hold);
        assert_eq!(record.rule, Rule::InsufficientCash);
        assert_eq!(next.cash, dec!(100));
        assert!(next.is_flat());
        assert_eq!(next.current_index, 1);
    }

    #[test]
    fn test_tiny_prices_buy_saturated_share_count() {
        let engine = StrategyEngine::default();

        // cash / price is 1e20, beyond u64
        let series = PriceSeries::new(vec![
            Decimal::new(1, 16),
            Decimal::new(2, 16),
            Decimal::new(3, 16),
        ])
        .unwrap();
        let (state, steps) = run_all(&engine, &series, StrategyKind::Greedy);

        assert_eq!(steps[0].decision, Decision::Buy);
        assert_eq!(steps[0].rule, Rule::Entry);
        assert_eq!(steps[0].resulting_position, u64::MAX);
        assert_eq!(steps[0].resulting_cash, dec!(8155.3255926290448385));
        assert_eq!(steps[1].decision, Decision::Sell);
        assert_eq!(steps[1].rule, Rule::TakeProfit);
        assert_eq!(steps[1].realized_profit, dec!(1844.6744073709551615));
        assert_eq!(state.cash, dec!(11844.6744073709551615));

        // cash / price is 1e29, beyond Decimal
        let series = PriceSeries::new(vec![Decimal::new(1, 25), Decimal::new(2, 25)]).unwrap();
        let (next, record) = engine.advance(&engine.reset(dec!(10000)), &series, StrategyKind::Greedy);

        assert_eq!(record.decision, Decision::Buy);
        assert_eq!(next.position_shares, u64::MAX);
        assert!(next.cash > Decimal::ZERO && next.cash < dec!(10000));
    }

    #[test]
    fn test_stop_loss_books_negative_profit() {
        let engine = StrategyEngine::default();
        let series = PriceSeries::new(vec![
            dec!(100),
            dec!(102),
            dec!(100.5),
            dec!(98.5),
            dec!(98),
            dec!(97),
        ])
        .unwrap();

        let (state, steps) = run_all(&engine, &series, StrategyKind::Greedy);
        assert_eq!(steps[0].decision, Decision::Buy);
        assert_eq!(steps[0].resulting_position, 100);
        assert_eq!(steps[0].resulting_cash, dec!(0));
        assert_eq!(steps[1].rule, Rule::HoldPosition);
        assert_eq!(steps[2].rule, Rule::HoldPosition);
        assert_eq!(steps[3].rule, Rule::HoldPosition);

        assert_eq!(steps[4].decision, Decision::Sell);
        assert_eq!(steps[4].rule, Rule::StopLoss);
        assert_eq!(steps[4].realized_profit, dec!(-200));
        assert_eq!(steps[4].resulting_cash, dec!(9800));
        assert_eq!(state.cash, dec!(9800));
    }

    #[test]
    fn test_preemptive_exit_before_drop() {
        let engine = StrategyEngine::default();
        let series = PriceSeries::from_whole(&[100, 102, 97, 99]).unwrap();

        let (_, steps) = run_all(&engine, &series, StrategyKind::Greedy);
        // +2% at 102 is below take profit, but 97 < 102 * 0.98
        assert_eq!(steps[1].decision, Decision::Sell);
        assert_eq!(steps[1].rule, Rule::PreemptiveExit);
        assert_eq!(steps[1].realized_profit, dec!(200));
        assert_eq!(steps[1].resulting_cash, dec!(10200));
    }

    #[test]
    fn test_invariants_hold_on_random_series() {
        let engine = StrategyEngine::default();
        for seed in 0..20u64 {
            let mut feed = PriceFeed::new(seed);
            let series = feed.generate_series("NVDA", 60).unwrap();
            for kind in StrategyKind::ALL {
                let mut state = engine.reset(dec!(10000));
                let mut realized = Decimal::ZERO;
                while state.current_index < series.last_index() {
                    let (next, record) = engine.advance(&state, &series, kind);
                    assert!(record.resulting_cash >= Decimal::ZERO);
                    assert_eq!(next.position_shares == 0, next.buy_price.is_zero());
                    if record.decision != Decision::Sell {
                        assert_eq!(record.realized_profit, Decimal::ZERO);
                    }
                    realized += record.realized_profit;
                    state = next;
                }

                let last = series.last();
                assert_eq!(
                    realized + state.unrealized_pnl(last),
                    state.market_value(last) - dec!(10000),
                    "seed {seed} strategy {kind}"
                );
            }
        }
    }
}
