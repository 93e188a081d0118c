//! Compact JSON exchange payload for text-generation requests.
//!
//! The provider gets the KPI summary plus a bounded sample of rows, so the
//! request size stays flat no matter how large the uploaded table is.

use serde::Serialize;

use crate::kpi::KpiSummary;
use crate::normalize::{Transaction, TransactionTable};

pub const DEFAULT_SAMPLE_ROWS: usize = 50;

#[derive(Debug, Serialize)]
struct InsightPayload<'a> {
    kpis: &'a KpiSummary,
    sample_rows: Vec<SampleRow<'a>>,
}

/// The human-relevant slice of a transaction, with the day rendered as text.
#[derive(Debug, Serialize)]
struct SampleRow<'a> {
    day: String,
    product: &'a str,
    category: Option<&'a str>,
    quantity: i64,
    unit_price: f64,
    discount: f64,
    revenue: f64,
}

impl<'a> From<&'a Transaction> for SampleRow<'a> {
    fn from(row: &'a Transaction) -> Self {
        Self {
            day: row.day.format("%Y-%m-%d").to_string(),
            product: &row.product,
            category: row.category.as_deref(),
            quantity: row.quantity,
            unit_price: row.unit_price,
            discount: row.discount,
            revenue: row.revenue,
        }
    }
}

/// Serialize `{kpis, sample_rows}` with at most `max_rows` sample rows.
pub fn build_insight_payload(
    table: &TransactionTable,
    kpis: &KpiSummary,
    max_rows: usize,
) -> String {
    let payload = InsightPayload {
        kpis,
        sample_rows: table.rows().iter().take(max_rows).map(Into::into).collect(),
    };
    // Serialization of plain structs and numbers cannot fail.
    serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::compute_kpis;
    use crate::normalize::{normalize, RawTable};

    fn sample_table(rows: usize) -> TransactionTable {
        let raw = RawTable::new(
            ["date", "product", "quantity", "unit_price"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            (0..rows)
                .map(|i| {
                    vec![
                        "2024-03-01".to_string(),
                        format!("P{i}"),
                        "1".to_string(),
                        "10".to_string(),
                    ]
                })
                .collect(),
        );
        normalize(&raw)
    }

    #[test]
    fn test_payload_shape() {
        let table = sample_table(2);
        let kpis = compute_kpis(&table);
        let payload = build_insight_payload(&table, &kpis, DEFAULT_SAMPLE_ROWS);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["kpis"]["total_orders"], 2);
        assert_eq!(value["sample_rows"].as_array().unwrap().len(), 2);
        assert_eq!(value["sample_rows"][0]["day"], "2024-03-01");
        assert_eq!(value["sample_rows"][0]["product"], "P0");
        assert_eq!(value["sample_rows"][0]["revenue"], 10.0);
    }

    #[test]
    fn test_sample_rows_bounded() {
        let table = sample_table(80);
        let kpis = compute_kpis(&table);
        let payload = build_insight_payload(&table, &kpis, DEFAULT_SAMPLE_ROWS);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["sample_rows"].as_array().unwrap().len(), 50);
        // KPIs still cover the full table.
        assert_eq!(value["kpis"]["total_orders"], 80);
    }

    #[test]
    fn test_empty_table_payload() {
        let table = TransactionTable::new();
        let kpis = compute_kpis(&table);
        let payload = build_insight_payload(&table, &kpis, DEFAULT_SAMPLE_ROWS);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(value["sample_rows"].as_array().unwrap().is_empty());
        assert!(value["kpis"]["top_product"].is_null());
    }
}
