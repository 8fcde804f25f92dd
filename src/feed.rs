//! Synthetic price data: the fixed demo series and a seeded random-walk feed.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::PriceSeries;

/// Per-step volatility of the random walk (2% of price).
const VOLATILITY: f64 = 0.02;

/// Price floor so a walk can never reach zero.
const MIN_PRICE: Decimal = dec!(0.01);

const DEMO_PRICES: [i64; 24] = [
    150, 148, 155, 149, 162, 158, 170, 165, 175, 168, 180, 172, 185, 178, 190, 182, 195, 188, 200,
    192, 205, 198, 210, 203,
];

/// The 24-tick series used by the strategy comparison.
pub fn demo_series() -> PriceSeries {
    PriceSeries::from_whole(&DEMO_PRICES).expect("demo prices are positive")
}

/// A single simulated market quote.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_pct: Decimal,
    pub volume: u64,
    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
}

/// Random-walk quote generator with an explicit seed.
pub struct PriceFeed {
    rng: StdRng,
    base_prices: HashMap<String, Decimal>,
}

impl PriceFeed {
    /// Starting price for symbols without a configured base.
    pub const DEFAULT_PRICE: Decimal = dec!(100);

    /// Create a feed with the default symbol universe.
    pub fn new(seed: u64) -> Self {
        let base_prices = [
            ("AAPL", dec!(173.50)),
            ("GOOGL", dec!(140.15)),
            ("MSFT", dec!(378.85)),
            ("TSLA", dec!(248.42)),
            ("AMZN", dec!(145.86)),
            ("NVDA", dec!(875.28)),
            ("META", dec!(484.20)),
            ("NFLX", dec!(445.03)),
        ]
        .into_iter()
        .map(|(symbol, price)| (symbol.to_string(), price))
        .collect();

        Self {
            rng: StdRng::seed_from_u64(seed),
            base_prices,
        }
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.base_prices.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Current walk position for `symbol`.
    pub fn base_price(&self, symbol: &str) -> Decimal {
        self.base_prices
            .get(symbol)
            .copied()
            .unwrap_or(Self::DEFAULT_PRICE)
    }

    /// Step the walk for `symbol` once and return the new quote.
    pub fn next_quote(&mut self, symbol: &str) -> Quote {
        let base = self.base_price(symbol);
        let base_f64 = base.to_f64().unwrap_or(100.0);

        let change = (self.rng.gen::<f64>() - 0.5) * VOLATILITY * base_f64;
        let price = to_cents(base_f64 + change).max(MIN_PRICE);
        self.base_prices.insert(symbol.to_string(), price);

        let price_f64 = price.to_f64().unwrap_or(base_f64);
        let high = to_cents(price_f64 * (1.0 + self.rng.gen::<f64>() * VOLATILITY));
        let low = to_cents(price_f64 * (1.0 - self.rng.gen::<f64>() * VOLATILITY)).max(MIN_PRICE);
        let open = to_cents(base_f64 * (1.0 + (self.rng.gen::<f64>() - 0.5) * 0.01));
        let volume = self.rng.gen_range(500_000..1_500_000);

        let change = price - base;
        let change_pct = (change / base * dec!(100)).round_dp(2);

        debug!(symbol, price = %price, change = %change, "Generated quote");

        Quote {
            symbol: symbol.to_string(),
            price,
            change,
            change_pct,
            volume,
            high,
            low,
            open,
        }
    }

    /// Walk `symbol` forward `points` times and collect the prices.
    pub fn generate_series(&mut self, symbol: &str, points: usize) -> Result<PriceSeries> {
        let prices = (0..points).map(|_| self.next_quote(symbol).price).collect();
        PriceSeries::new(prices)
    }
}

fn to_cents(value: f64) -> Decimal {
    Decimal::try_from(value)
        .map(|d| d.round_dp(2))
        .unwrap_or(MIN_PRICE)
}
