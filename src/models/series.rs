//! Immutable price series consumed one tick at a time.

use std::ops::Index;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, Result};

/// Ordered, non-empty sequence of strictly positive prices indexed from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    prices: Vec<Decimal>,
}

impl PriceSeries {
    /// Validate and wrap a list of prices.
    pub fn new(prices: Vec<Decimal>) -> Result<Self> {
        if prices.is_empty() {
            return Err(EngineError::EmptySeries);
        }
        if let Some((index, price)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| **p <= Decimal::ZERO)
        {
            return Err(EngineError::NonPositivePrice {
                index,
                price: *price,
            });
        }
        Ok(Self { prices })
    }

    /// Build a series from whole-dollar prices.
    pub fn from_whole(prices: &[i64]) -> Result<Self> {
        Self::new(prices.iter().copied().map(Decimal::from).collect())
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn get(&self, index: usize) -> Option<Decimal> {
        self.prices.get(index).copied()
    }

    /// Last price of the series.
    pub fn last(&self) -> Decimal {
        self.prices[self.prices.len() - 1]
    }

    /// Index of the final sample. A cursor at or past it has nothing left to trade.
    pub fn last_index(&self) -> usize {
        self.prices.len() - 1
    }

    /// Up to `window` prices strictly after `index`.
    pub fn lookahead(&self, index: usize, window: usize) -> &[Decimal] {
        let start = (index + 1).min(self.prices.len());
        let end = start.saturating_add(window).min(self.prices.len());
        &self.prices[start..end]
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.prices
    }
}

impl Index<usize> for PriceSeries {
    type Output = Decimal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.prices[index]
    }
}
