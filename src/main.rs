//! Strategy Visualizer
//!
//! Steps greedy, lookahead and knapsack trading strategies tick by tick over
//! synthetic price data and prints an auditable decision log.

mod error;
mod feed;
mod metrics;
mod models;
mod report;
mod scheduler;
mod simulation;
mod trading;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::feed::{demo_series, PriceFeed};
use crate::metrics::RunMetrics;
use crate::models::{Decision, PriceSeries, StepRecord};
use crate::report::RunReport;
use crate::scheduler::{RunOutcome, TickScheduler};
use crate::simulation::Simulation;
use crate::trading::{EngineConfig, KnapsackConfig, StrategyEngine, StrategyKind};

/// Trading strategy simulator CLI.
#[derive(Parser)]
#[command(name = "stratviz")]
#[command(about = "Step trading strategies over synthetic price data", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STRATVIZ_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Where the price series comes from. Without a seed the fixed demo series is used.
#[derive(Args, Debug, Clone)]
struct SeriesArgs {
    /// Seed for a generated random-walk series
    #[arg(long, env = "STRATVIZ_SEED")]
    seed: Option<u64>,

    /// Symbol to generate prices for
    #[arg(long, env = "STRATVIZ_SYMBOL", default_value = "AAPL")]
    symbol: String,

    /// Number of generated prices
    #[arg(long, env = "STRATVIZ_POINTS", default_value = "60")]
    points: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one strategy live, one tick per interval
    Run {
        /// Strategy (greedy, dp, knapsack)
        #[arg(short, long, env = "STRATVIZ_STRATEGY", default_value = "greedy")]
        strategy: StrategyKind,

        /// Initial cash
        #[arg(short, long, env = "STRATVIZ_CAPITAL", default_value = "10000")]
        capital: f64,

        /// Milliseconds between ticks
        #[arg(short, long, env = "STRATVIZ_INTERVAL_MS", default_value = "500")]
        interval_ms: u64,

        /// Print step records as JSON lines
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        series: SeriesArgs,
    },

    /// Run all strategies over the same series and compare
    Compare {
        /// Initial cash
        #[arg(short, long, env = "STRATVIZ_CAPITAL", default_value = "10000")]
        capital: f64,

        #[command(flatten)]
        series: SeriesArgs,
    },

    /// Show the knapsack optimizer's selection for the stock catalog
    Knapsack {
        /// Total risk weight available
        #[arg(short, long, env = "STRATVIZ_CAPACITY", default_value = "10")]
        capacity: u32,
    },

    /// Print quotes from the synthetic price feed
    Feed {
        /// Symbol to quote
        #[arg(long, default_value = "AAPL")]
        symbol: String,

        /// Number of quotes
        #[arg(long, default_value = "20")]
        points: usize,

        /// Random seed
        #[arg(long, env = "STRATVIZ_SEED", default_value = "42")]
        seed: u64,

        /// Quote every known symbol instead of one
        #[arg(long)]
        all: bool,
    },

    /// Show current configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a strategy to completion and write a JSON report
    Report {
        /// Strategy (greedy, dp, knapsack)
        #[arg(short, long, env = "STRATVIZ_STRATEGY", default_value = "greedy")]
        strategy: StrategyKind,

        /// Initial cash
        #[arg(short, long, env = "STRATVIZ_CAPITAL", default_value = "10000")]
        capital: f64,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        series: SeriesArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            strategy,
            capital,
            interval_ms,
            json,
            series,
        } => {
            let engine = build_engine(capital)?;
            let prices = load_series(&series)?;
            let mut sim = Simulation::new(engine, prices, strategy);

            info!(
                strategy = %strategy,
                capital = capital,
                interval_ms = interval_ms,
                points = sim.series().len(),
                "Starting simulation"
            );

            let scheduler = TickScheduler::new(Duration::from_millis(interval_ms));
            scheduler.stop_on_ctrl_c();

            if !json {
                println!("\n=== {} ===", strategy.name());
                println!("{}", strategy.description());
                println!("Complexity:  {}", strategy.complexity());
                println!("Capital:     ${}", capital);
                println!("Series:      {}", series_label(&series, sim.series()));
                println!("Interval:    {}ms", scheduler.cadence().as_millis());
                println!("\nPress Ctrl+C to stop.\n");
                print_step_header();
            }

            let outcome = scheduler
                .run(&mut sim, |step| {
                    if json {
                        match serde_json::to_string(step) {
                            Ok(line) => println!("{}", line),
                            Err(e) => warn!(error = %e, index = step.index, "Failed to encode step"),
                        }
                    } else {
                        print_step(step);
                    }
                })
                .await;

            if json {
                return Ok(());
            }

            match outcome {
                RunOutcome::Finished { .. } => println!("\nFinished after {} ticks.", outcome.ticks()),
                RunOutcome::Stopped { .. } => println!("\nStopped after {} ticks.", outcome.ticks()),
            }
            println!("{}", sim.stats());
            println!("{}", RunMetrics::from_steps(sim.steps(), sim.initial_cash()));
        }

        Commands::Compare { capital, series } => {
            let prices = load_series(&series)?;

            println!("\n=== Strategy Comparison ===");
            println!("Capital: ${}", capital);
            println!("Series:  {}\n", series_label(&series, &prices));
            println!(
                "{:<22} {:<6} {:>6} {:>7} {:>12} {:>12} {:>9} {:>8}",
                "STRATEGY", "BIG-O", "TRADES", "WIN%", "REALIZED", "VALUE", "RETURN", "MAX DD"
            );
            println!("{}", "-".repeat(89));

            // One session, reset by each strategy switch
            let mut sim = Simulation::new(build_engine(capital)?, prices, StrategyKind::Greedy);
            let mut best: Option<(StrategyKind, Decimal)> = None;
            for kind in StrategyKind::ALL {
                if kind != sim.strategy() {
                    sim.select_strategy(kind);
                }
                sim.run_to_end();
                let metrics = RunMetrics::from_steps(sim.steps(), sim.initial_cash());
                let value = sim.portfolio_value();

                println!(
                    "{:<22} {:<6} {:>6} {:>6.1}% {:>12.2} {:>12.2} {:>8.2}% {:>7.2}%",
                    kind.name(),
                    kind.complexity(),
                    sim.steps().iter().filter(|s| s.is_trade()).count(),
                    metrics.win_rate * 100.0,
                    metrics.total_realized,
                    value,
                    sim.total_return_pct() * dec!(100),
                    metrics.max_drawdown * 100.0
                );

                if best.map_or(true, |(_, v)| value > v) {
                    best = Some((kind, value));
                }
            }

            if let Some((kind, value)) = best {
                println!("\nBest: {} (${:.2})", kind.name(), value);
            }
        }

        Commands::Knapsack { capacity } => {
            let config = EngineConfig {
                knapsack: KnapsackConfig {
                    capacity,
                    ..Default::default()
                },
                ..Default::default()
            };
            let engine = StrategyEngine::new(config)?;
            let snapshot = engine.solve_knapsack();
            let threshold = engine.config().knapsack.min_avg_value;

            println!("\n=== Portfolio Knapsack (capacity {}) ===\n", snapshot.capacity);
            println!("{:<8} {:>6} {:>6}  {}", "STOCK", "WEIGHT", "VALUE", "SELECTED");
            println!("{}", "-".repeat(32));
            for entry in &snapshot.items {
                println!(
                    "{:<8} {:>6} {:>6}  {}",
                    entry.item.stock,
                    entry.item.weight,
                    entry.item.value,
                    if entry.selected { "yes" } else { "" }
                );
            }

            let average = snapshot.average_selected_value();
            println!("\nSelection:      {}", snapshot.selected_stocks().join(", "));
            println!("Total Value:    {}", snapshot.total_value);
            println!("Total Weight:   {}/{}", snapshot.total_weight, snapshot.capacity);
            println!("Average Value:  {:.2}", average);
            println!(
                "Entry Signal:   {} (threshold {})",
                if average >= threshold { "yes" } else { "no" },
                threshold
            );
        }

        Commands::Feed {
            symbol,
            points,
            seed,
            all,
        } => {
            let mut feed = PriceFeed::new(seed);
            let symbols: Vec<String> = if all {
                feed.symbols().into_iter().map(String::from).collect()
            } else {
                vec![symbol]
            };
            info!(symbols = symbols.len(), points = points, seed = seed, "Generating quotes");

            println!(
                "\n{:<6} {:>10} {:>9} {:>8} {:>10} {:>10} {:>10} {:>10}",
                "SYMBOL", "PRICE", "CHANGE", "CHG%", "OPEN", "HIGH", "LOW", "VOLUME"
            );
            println!("{}", "-".repeat(82));
            for _ in 0..points {
                for symbol in &symbols {
                    let q = feed.next_quote(symbol);
                    println!(
                        "{:<6} {:>10.2} {:>+9.2} {:>7.2}% {:>10.2} {:>10.2} {:>10.2} {:>10}",
                        q.symbol, q.price, q.change, q.change_pct, q.open, q.high, q.low, q.volume
                    );
                }
            }
        }

        Commands::Config { json } => {
            let config = EngineConfig::default();

            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            println!("\n=== Engine Configuration ===\n");
            println!("Initial Cash:         ${}", config.initial_cash);

            println!("\nGreedy:");
            println!("  Entry Rise:         {}%", config.greedy.entry_rise * dec!(100));
            println!("  Take Profit:        {}%", config.greedy.take_profit * dec!(100));
            println!("  Stop Loss:          {}%", config.greedy.stop_loss * dec!(100));
            println!("  Exit Drop:          {}%", config.greedy.exit_drop * dec!(100));

            println!("\nDynamic Programming:");
            println!("  Window:             {} ticks", config.lookahead.window);
            println!("  Min Peak Gain:      {}%", config.lookahead.min_peak_gain * dec!(100));
            println!("  Min Avg Gain:       {}%", config.lookahead.min_avg_gain * dec!(100));
            println!("  Peak Proximity:     {}%", config.lookahead.peak_proximity * dec!(100));
            println!("  Downside Limit:     {}%", config.lookahead.downside_limit * dec!(100));
            println!("  Take Profit:        {}%", config.lookahead.take_profit * dec!(100));

            println!("\nPortfolio Knapsack:");
            println!("  Capacity:           {}", config.knapsack.capacity);
            println!("  Min Avg Value:      {}", config.knapsack.min_avg_value);
            println!("  Take Profit:        {}%", config.knapsack.take_profit * dec!(100));
            println!("  Catalog:");
            for item in &config.knapsack.catalog {
                println!("    {:<6} weight {:>2}  value {:>2}", item.stock, item.weight, item.value);
            }
        }

        Commands::Report {
            strategy,
            capital,
            output,
            series,
        } => {
            let engine = build_engine(capital)?;
            let prices = load_series(&series)?;
            let mut sim = Simulation::new(engine, prices, strategy);
            sim.run_to_end();

            let report = RunReport::from_simulation(&sim);
            match output {
                Some(path) => {
                    report.write_to(&path)?;
                    println!("Report written to {}", path.display());
                }
                None => println!("{}", report.to_json()?),
            }
        }
    }

    Ok(())
}

/// Engine with default thresholds and the given starting cash.
fn build_engine(capital: f64) -> Result<StrategyEngine> {
    let initial_cash = Decimal::try_from(capital).context("Invalid capital amount")?;
    let config = EngineConfig {
        initial_cash,
        ..Default::default()
    };
    Ok(StrategyEngine::new(config)?)
}

fn load_series(args: &SeriesArgs) -> Result<PriceSeries> {
    match args.seed {
        Some(seed) => PriceFeed::new(seed)
            .generate_series(&args.symbol, args.points)
            .with_context(|| format!("Failed to generate {} series", args.symbol)),
        None => Ok(demo_series()),
    }
}

fn series_label(args: &SeriesArgs, series: &PriceSeries) -> String {
    let prices = series.as_slice();
    let low = prices.iter().min().copied().unwrap_or_default();
    let high = prices.iter().max().copied().unwrap_or_default();

    match args.seed {
        Some(seed) => format!(
            "{} random walk, seed {}, {} points, {:.2}-{:.2}",
            args.symbol,
            seed,
            series.len(),
            low,
            high
        ),
        None => format!("demo, {} points, {:.2}-{:.2}", series.len(), low, high),
    }
}

fn print_step_header() {
    println!(
        "{:>4} {:>10} {:<5} {:>7} {:>12} {:>10}  {}",
        "TICK", "PRICE", "ACT", "SHARES", "CASH", "P&L", "REASON"
    );
    println!("{}", "-".repeat(80));
}

fn print_step(step: &StepRecord) {
    let pnl = if step.decision == Decision::Sell {
        format!("{:+.2}", step.realized_profit)
    } else {
        String::new()
    };

    println!(
        "{:>4} {:>10.2} {:<5} {:>7} {:>12.2} {:>10}  {}",
        step.index,
        step.price,
        step.decision.as_str(),
        step.resulting_position,
        step.resulting_cash,
        pnl,
        step.reasoning
    );

    if let Some(snapshot) = &step.knapsack {
        println!(
            "{:>4} knapsack: {} (value {}, weight {}/{})",
            "",
            snapshot.selected_stocks().join(" + "),
            snapshot.total_value,
            snapshot.total_weight,
            snapshot.capacity
        );
    }
}
