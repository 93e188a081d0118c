//! Data contract with the report assembler and chart renderer.
//!
//! Rendering itself (PDF layout, chart images) lives outside this crate. The
//! functions here produce everything the assembler consumes: formatted KPI
//! rows and the revenue groupings behind the two standard charts.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::kpi::KpiSummary;
use crate::llm::types::BusinessInsights;
use crate::normalize::TransactionTable;

pub const REPORT_TITLE: &str = "Retail Insights Executive Report";

pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// Everything the out-of-scope report assembler needs for one document.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub title: String,
    pub kpis: KpiSummary,
    pub kpi_rows: Vec<(String, String)>,
    pub top_products: Vec<(String, f64)>,
    pub daily_revenue: Vec<(NaiveDate, f64)>,
    pub top_products_png: Vec<u8>,
    pub daily_revenue_png: Option<Vec<u8>>,
    pub insights: Option<BusinessInsights>,
}

/// Label/value pairs for the KPI table, formatted for display.
pub fn kpi_table_rows(kpis: &KpiSummary) -> Vec<(String, String)> {
    vec![
        ("Total Revenue".to_string(), format_money(kpis.total_revenue)),
        (
            "Total Orders".to_string(),
            group_thousands(&kpis.total_orders.to_string()),
        ),
        (
            "Avg Order Value".to_string(),
            format_money(kpis.avg_order_value),
        ),
        (
            "Top Product".to_string(),
            kpis.top_product.clone().unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Top Category".to_string(),
            kpis.top_category.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ]
}

/// Aggregate revenue per product, highest first, at most `top_n` entries.
/// Ties keep lexicographic order.
pub fn top_products_by_revenue(table: &TransactionTable, top_n: usize) -> Vec<(String, f64)> {
    let mut grouped: BTreeMap<&str, f64> = BTreeMap::new();
    for row in table.rows() {
        *grouped.entry(row.product.as_str()).or_default() += row.revenue;
    }
    let mut products: Vec<(String, f64)> = grouped
        .into_iter()
        .map(|(name, revenue)| (name.to_string(), revenue))
        .collect();
    products.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    products.truncate(top_n);
    products
}

/// Aggregate revenue per day, in date order.
pub fn daily_revenue_series(table: &TransactionTable) -> Vec<(NaiveDate, f64)> {
    let mut grouped: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in table.rows() {
        *grouped.entry(row.day).or_default() += row.revenue;
    }
    grouped.into_iter().collect()
}

/// Currency display: rupee sign, thousands separators, 2 decimals.
pub fn format_money(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let cents = (rounded.abs() * 100.0).round() as u64;
    format!(
        "₹{}{}.{:02}",
        sign,
        group_thousands(&(cents / 100).to_string()),
        cents % 100
    )
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::compute_kpis;
    use crate::normalize::{normalize, RawTable};

    fn table() -> TransactionTable {
        let raw = RawTable::new(
            ["date", "product", "quantity", "unit_price"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            vec![
                vec!["2024-01-02".into(), "Tea".into(), "1".into(), "30".into()],
                vec!["2024-01-01".into(), "Milk".into(), "2".into(), "50".into()],
                vec!["2024-01-01".into(), "Tea".into(), "1".into(), "30".into()],
            ],
        );
        normalize(&raw)
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "₹0.00");
        assert_eq!(format_money(1234567.891), "₹1,234,567.89");
        assert_eq!(format_money(-5.0), "₹-5.00");
        assert_eq!(format_money(999.999), "₹1,000.00");
    }

    #[test]
    fn test_kpi_rows_cover_all_kpis() {
        let rows = kpi_table_rows(&compute_kpis(&table()));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], ("Total Revenue".to_string(), "₹160.00".to_string()));
        assert_eq!(rows[3].1, "Milk");
    }

    #[test]
    fn test_kpi_rows_for_empty_data() {
        let rows = kpi_table_rows(&KpiSummary::default());
        assert_eq!(rows[3].1, "-");
        assert_eq!(rows[4].1, "-");
    }

    #[test]
    fn test_top_products_sorted_and_bounded() {
        let products = top_products_by_revenue(&table(), 1);
        assert_eq!(products, vec![("Milk".to_string(), 100.0)]);
    }

    #[test]
    fn test_daily_revenue_in_date_order() {
        let series = daily_revenue_series(&table());
        assert_eq!(
            series,
            vec![
                (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 130.0),
                (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 30.0),
            ]
        );
    }
}
