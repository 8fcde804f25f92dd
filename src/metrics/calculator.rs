//! Calculator for run metrics: win rate, profit factor, drawdown, tick volatility.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use super::RunMetrics;
use crate::models::{Decision, StepRecord};

/// Calculator for computing run metrics from a step log.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate metrics for `steps`, starting the equity curve at `initial_cash`.
    pub fn calculate(steps: &[StepRecord], initial_cash: Decimal) -> RunMetrics {
        let mut metrics = RunMetrics {
            ticks: steps.len(),
            peak_equity: initial_cash,
            final_equity: initial_cash,
            ..Default::default()
        };

        if steps.is_empty() {
            return metrics;
        }

        metrics.buys = steps.iter().filter(|s| s.decision == Decision::Buy).count() as u32;

        let pnls: Vec<Decimal> = steps
            .iter()
            .filter(|s| s.decision == Decision::Sell)
            .map(|s| s.realized_profit)
            .collect();
        metrics.sells = pnls.len() as u32;
        Self::calculate_pnl_metrics(&mut metrics, &pnls);

        let equity: Vec<Decimal> = std::iter::once(initial_cash)
            .chain(steps.iter().map(StepRecord::equity))
            .collect();
        Self::calculate_drawdown(&mut metrics, &equity);
        Self::calculate_tick_returns(&mut metrics, &equity);

        metrics
    }

    fn calculate_pnl_metrics(metrics: &mut RunMetrics, pnls: &[Decimal]) {
        if pnls.is_empty() {
            return;
        }

        let (wins, losses): (Vec<Decimal>, Vec<Decimal>) =
            pnls.iter().partition(|&&p| p > Decimal::ZERO);

        metrics.winning_trades = wins.len() as u32;
        metrics.losing_trades = losses.len() as u32;
        metrics.total_realized = pnls.iter().copied().sum();
        metrics.win_rate = wins.len() as f64 / pnls.len() as f64;

        let gross_profit: Decimal = wins.iter().copied().sum();
        let gross_loss: Decimal = losses.iter().map(|l| l.abs()).sum();

        if !wins.is_empty() {
            metrics.avg_win = gross_profit / Decimal::from(wins.len() as u32);
        }
        if !losses.is_empty() {
            metrics.avg_loss = gross_loss / Decimal::from(losses.len() as u32);
        }

        if gross_loss > Decimal::ZERO {
            metrics.profit_factor =
                gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0);
        }
    }

    /// Max drawdown over the marked-to-market equity curve.
    fn calculate_drawdown(metrics: &mut RunMetrics, equity: &[Decimal]) {
        let mut peak = Decimal::ZERO;
        let mut max_dd = Decimal::ZERO;
        let mut max_dd_pct = 0.0f64;

        for &value in equity {
            if value > peak {
                peak = value;
            }

            if peak > Decimal::ZERO {
                let dd = peak - value;
                if dd > max_dd {
                    max_dd = dd;
                }

                let dd_pct = (dd / peak).to_f64().unwrap_or(0.0);
                if dd_pct > max_dd_pct {
                    max_dd_pct = dd_pct;
                }
            }
        }

        metrics.max_drawdown = max_dd_pct;
        metrics.max_drawdown_abs = max_dd;
        metrics.peak_equity = peak;
        metrics.final_equity = equity.last().copied().unwrap_or(peak);
    }

    fn calculate_tick_returns(metrics: &mut RunMetrics, equity: &[Decimal]) {
        let returns: Vec<f64> = equity
            .windows(2)
            .filter(|w| w[0] > Decimal::ZERO)
            .filter_map(|w| ((w[1] - w[0]) / w[0]).to_f64())
            .collect();

        if returns.is_empty() {
            return;
        }

        metrics.mean_tick_return = returns.as_slice().mean();

        // Sample std dev needs two points
        if returns.len() >= 2 {
            metrics.tick_volatility = returns.as_slice().std_dev();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::demo_series;
    use crate::models::Rule;
    use crate::simulation::Simulation;
    use crate::trading::{StrategyEngine, StrategyKind};
    use rust_decimal_macros::dec;

    fn record(decision: Decision, profit: Decimal, position: u64, cash: Decimal) -> StepRecord {
        StepRecord {
            index: 0,
            price: dec!(100),
            decision,
            realized_profit: profit,
            reasoning: String::new(),
            rule: Rule::HoldPosition,
            resulting_position: position,
            resulting_cash: cash,
            knapsack: None,
        }
    }

    #[test]
    fn test_calculate_pnl_metrics() {
        let steps = vec![
            record(Decision::Buy, dec!(0), 10, dec!(0)),
            record(Decision::Sell, dec!(100), 0, dec!(1100)),
            record(Decision::Buy, dec!(0), 11, dec!(0)),
            record(Decision::Sell, dec!(-50), 0, dec!(1050)),
            record(Decision::Hold, dec!(0), 0, dec!(1050)),
            record(Decision::Buy, dec!(0), 10, dec!(50)),
            record(Decision::Sell, dec!(200), 0, dec!(1250)),
        ];

        let metrics = MetricsCalculator::calculate(&steps, dec!(1000));

        assert_eq!(metrics.ticks, 7);
        assert_eq!(metrics.buys, 3);
        assert_eq!(metrics.sells, 3);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 1);
        assert_eq!(metrics.total_realized, dec!(250));
        assert_eq!(metrics.avg_win, dec!(150));
        assert_eq!(metrics.avg_loss, dec!(50));
        assert!((metrics.win_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.profit_factor - 6.0).abs() < 1e-9);
        assert_eq!(metrics.final_equity, dec!(1250));
    }

    #[test]
    fn test_calculate_drawdown() {
        let steps = vec![
            record(Decision::Hold, dec!(0), 0, dec!(1200)),
            record(Decision::Hold, dec!(0), 0, dec!(900)),
        ];

        let metrics = MetricsCalculator::calculate(&steps, dec!(1000));

        // 1000 -> 1200 -> 900: 300 below a 1200 peak
        assert!((metrics.max_drawdown - 0.25).abs() < 1e-9);
        assert_eq!(metrics.max_drawdown_abs, dec!(300));
        assert_eq!(metrics.peak_equity, dec!(1200));
        assert!((metrics.mean_tick_return - (-0.025)).abs() < 1e-9);
        assert!(metrics.tick_volatility > 0.0);
    }

    #[test]
    fn test_empty_log() {
        let metrics = MetricsCalculator::calculate(&[], dec!(10000));

        assert_eq!(metrics.ticks, 0);
        assert_eq!(metrics.round_trips(), 0);
        assert_eq!(metrics.final_equity, dec!(10000));
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn test_greedy_demo_metrics() {
        let mut sim = Simulation::new(StrategyEngine::default(), demo_series(), StrategyKind::Greedy);
        sim.run_to_end();

        let metrics = RunMetrics::from_steps(sim.steps(), sim.initial_cash());

        assert_eq!(metrics.ticks, 23);
        assert_eq!(metrics.buys, 11);
        assert_eq!(metrics.sells, 11);
        assert_eq!(metrics.winning_trades, 11);
        assert_eq!(metrics.losing_trades, 0);
        assert_eq!(metrics.total_realized, dec!(10540));
        assert_eq!(metrics.final_equity, dec!(20540));
        assert_eq!(metrics.profit_factor, 0.0);
        assert!(metrics.to_string().contains("Profit Factor:    n/a"));
    }
}
