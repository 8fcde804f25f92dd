//! Cash and share position carried between ticks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tradable wealth of one strategy run.
///
/// `position_shares == 0` exactly when `buy_price == 0`. The engine is the only
/// code that moves a state forward; callers treat it as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Uninvested cash, never negative
    pub cash: Decimal,

    /// Whole shares currently held
    pub position_shares: u64,

    /// Entry price of the open position, zero when flat
    pub buy_price: Decimal,

    /// Cursor into the price series
    pub current_index: usize,
}

impl PortfolioState {
    /// Fresh state at the start of a series.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            position_shares: 0,
            buy_price: Decimal::ZERO,
            current_index: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position_shares == 0
    }

    /// Cash plus shares marked at `price`.
    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.cash + Decimal::from(self.position_shares) * price
    }

    /// Paper gain of the open position at `price`.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        if self.is_flat() {
            return Decimal::ZERO;
        }
        Decimal::from(self.position_shares) * (price - self.buy_price)
    }

    /// Fractional return of the open position at `price`.
    pub fn return_pct(&self, price: Decimal) -> Decimal {
        if self.buy_price.is_zero() {
            return Decimal::ZERO;
        }
        (price - self.buy_price) / self.buy_price
    }
}
