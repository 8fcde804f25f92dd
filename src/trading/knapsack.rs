//! Exact 0/1 knapsack solver used by the portfolio strategy.

use crate::models::{KnapsackItem, KnapsackSelection, KnapsackSnapshot};

/// Solve the 0/1 knapsack exactly with an `(n + 1) x (capacity + 1)` table.
///
/// Reconstruction walks from the last item to the first and takes item `i`
/// only when `dp[i][w] != dp[i - 1][w]`, so among equal-valued optima the
/// later items are left out.
pub fn solve_knapsack(items: &[KnapsackItem], capacity: u32) -> KnapsackSnapshot {
    let n = items.len();
    let cap = capacity as usize;
    // u64 so summed u32 values cannot overflow
    let mut dp = vec![vec![0u64; cap + 1]; n + 1];

    for (i, item) in items.iter().enumerate() {
        let weight = item.weight as usize;
        for w in 0..=cap {
            let skip = dp[i][w];
            dp[i + 1][w] = if weight <= w {
                skip.max(dp[i][w - weight] + u64::from(item.value))
            } else {
                skip
            };
        }
    }

    let mut selected = vec![false; n];
    let mut w = cap;
    for i in (1..=n).rev() {
        if dp[i][w] != dp[i - 1][w] {
            selected[i - 1] = true;
            w -= items[i - 1].weight as usize;
        }
    }

    let total_weight: u32 = items
        .iter()
        .zip(&selected)
        .filter(|(_, s)| **s)
        .map(|(item, _)| item.weight)
        .sum();

    KnapsackSnapshot {
        capacity,
        items: items
            .iter()
            .cloned()
            .zip(selected)
            .map(|(item, selected)| KnapsackSelection { item, selected })
            .collect(),
        total_value: dp[n][cap],
        total_weight,
    }
}
