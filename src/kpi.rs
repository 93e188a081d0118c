//! KPI aggregation over normalized transactions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::TransactionTable;

/// Summary statistics for one transaction table. Recomputed fresh on every
/// data change; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    /// Sum of per-row revenue, rounded to 2 decimals.
    pub total_revenue: f64,
    pub total_orders: usize,
    /// total_revenue / total_orders, 0 for an empty table.
    pub avg_order_value: f64,
    /// Product with the highest aggregate revenue. Ties resolve to the
    /// lexicographically smallest name.
    pub top_product: Option<String>,
    /// Category with the highest aggregate revenue, ignoring rows without a
    /// category. Same tie-break as `top_product`.
    pub top_category: Option<String>,
}

/// Reduce a table into its KPI summary. Pure and order-invariant: sums and
/// arg-max groupings do not depend on row order.
pub fn compute_kpis(table: &TransactionTable) -> KpiSummary {
    if table.is_empty() {
        return KpiSummary::default();
    }

    let total_revenue: f64 = table.rows().iter().map(|r| r.revenue).sum();
    let total_orders = table.len();
    let avg_order_value = total_revenue / total_orders as f64;

    let mut product_revenue: BTreeMap<&str, f64> = BTreeMap::new();
    let mut category_revenue: BTreeMap<&str, f64> = BTreeMap::new();
    for row in table.rows() {
        *product_revenue.entry(row.product.as_str()).or_default() += row.revenue;
        if let Some(category) = &row.category {
            *category_revenue.entry(category.as_str()).or_default() += row.revenue;
        }
    }

    KpiSummary {
        total_revenue: round2(total_revenue),
        total_orders,
        avg_order_value: round2(avg_order_value),
        top_product: arg_max(&product_revenue),
        top_category: arg_max(&category_revenue),
    }
}

/// Highest-revenue group name. Iterating the BTreeMap in key order and
/// requiring a strict improvement keeps the smallest name on ties.
fn arg_max(groups: &BTreeMap<&str, f64>) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for (&name, &revenue) in groups {
        match best {
            Some((_, top)) if revenue <= top => {}
            _ => best = Some((name, revenue)),
        }
    }
    best.map(|(name, _)| name.to_string())
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
