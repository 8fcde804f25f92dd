//! Knapsack catalog items and the solution snapshot embedded in step records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A candidate holding with an integer risk weight and score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnapsackItem {
    pub stock: String,
    pub weight: u32,
    pub value: u32,
}

impl KnapsackItem {
    pub fn new(stock: impl Into<String>, weight: u32, value: u32) -> Self {
        Self {
            stock: stock.into(),
            weight,
            value,
        }
    }
}

/// A catalog item with its place in the optimal selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnapsackSelection {
    #[serde(flatten)]
    pub item: KnapsackItem,
    pub selected: bool,
}

/// Full solution of one knapsack solve. Derived data, rebuilt every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnapsackSnapshot {
    pub capacity: u32,
    pub items: Vec<KnapsackSelection>,
    pub total_value: u64,
    pub total_weight: u32,
}

impl KnapsackSnapshot {
    pub fn selected(&self) -> impl Iterator<Item = &KnapsackItem> {
        self.items.iter().filter(|s| s.selected).map(|s| &s.item)
    }

    pub fn selected_stocks(&self) -> Vec<&str> {
        self.selected().map(|i| i.stock.as_str()).collect()
    }

    /// Mean value of the selected items, zero for an empty selection.
    pub fn average_selected_value(&self) -> Decimal {
        let count = self.selected().count();
        if count == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.total_value) / Decimal::from(count as u64)
    }
}
