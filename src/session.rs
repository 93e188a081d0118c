//! Explicit per-session state owned by the dashboard shell.
//!
//! The pipeline functions (`normalize`, `compute_kpis`, `build_insight_payload`)
//! stay free of this state; the session is the single place that holds the
//! current table, its KPI cache, the latest insights, and the selected
//! provider client. One instance lives per dashboard session and is
//! discarded with it.

use chrono::{NaiveDate, NaiveTime};
use log::info;

use crate::error::Result;
use crate::kpi::{compute_kpis, KpiSummary};
use crate::llm::factory::InsightClient;
use crate::llm::prompts::build_insights_prompt;
use crate::llm::types::BusinessInsights;
use crate::normalize::{load_transactions_from_csv, Transaction, TransactionTable};
use crate::payload::{build_insight_payload, DEFAULT_SAMPLE_ROWS};
use crate::report::{
    daily_revenue_series, kpi_table_rows, top_products_by_revenue, ReportInputs,
    DEFAULT_TOP_PRODUCTS, REPORT_TITLE,
};

/// A manually-entered transaction from the dashboard form. Already typed, so
/// it skips string coercion and goes straight to a normalized row.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub date: NaiveDate,
    pub product: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub category: Option<String>,
    pub discount: f64,
    pub payment_method: Option<String>,
}

impl ManualEntry {
    fn into_transaction(self) -> Transaction {
        let date = self.date.and_time(NaiveTime::MIN);
        let product = if self.product.trim().is_empty() {
            "Unknown".to_string()
        } else {
            self.product
        };
        let revenue = self.quantity as f64 * self.unit_price - self.discount;
        Transaction {
            date,
            day: self.date,
            product,
            category: self.category.filter(|c| !c.trim().is_empty()),
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
            payment_method: self.payment_method.filter(|p| !p.trim().is_empty()),
            revenue,
        }
    }
}

pub struct DashboardSession {
    transactions: TransactionTable,
    kpis: KpiSummary,
    insights: Option<BusinessInsights>,
    client: InsightClient,
    sample_rows: usize,
}

impl DashboardSession {
    pub fn new(client: InsightClient) -> Self {
        Self {
            transactions: TransactionTable::new(),
            kpis: KpiSummary::default(),
            insights: None,
            client,
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }

    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    pub fn client(&self) -> &InsightClient {
        &self.client
    }

    pub fn transactions(&self) -> &TransactionTable {
        &self.transactions
    }

    pub fn kpis(&self) -> &KpiSummary {
        &self.kpis
    }

    pub fn insights(&self) -> Option<&BusinessInsights> {
        self.insights.as_ref()
    }

    /// Load uploaded CSV bytes, replacing the current table. On failure the
    /// previous table and KPIs are preserved untouched.
    pub fn load_csv_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let table = load_transactions_from_csv(bytes)?;
        let count = table.len();
        self.replace_table(table);
        Ok(count)
    }

    pub fn load_table(&mut self, table: TransactionTable) {
        self.replace_table(table);
    }

    /// Append one manually-entered transaction.
    pub fn add_entry(&mut self, entry: ManualEntry) {
        self.transactions.push(entry.into_transaction());
        self.recompute();
    }

    pub fn clear(&mut self) {
        self.replace_table(TransactionTable::new());
        info!("session data cleared");
    }

    /// Re-serialize the current table for download.
    pub fn export_csv(&self) -> String {
        self.transactions.to_csv_string()
    }

    /// Build the payload and prompt, call the provider, and cache the
    /// result. Provider failures follow the client's own degradation policy;
    /// KPIs and charts are unaffected either way.
    pub async fn refresh_insights(&mut self, temperature: f32) -> Result<&BusinessInsights> {
        let payload = build_insight_payload(&self.transactions, &self.kpis, self.sample_rows);
        let prompt = build_insights_prompt(&payload);
        let insights = self
            .client
            .generate_business_insights(&prompt, temperature)
            .await?;
        Ok(&*self.insights.insert(insights))
    }

    /// Assemble the report-assembler contract from current state plus the
    /// rendered chart images.
    pub fn report_inputs(
        &self,
        top_products_png: Vec<u8>,
        daily_revenue_png: Option<Vec<u8>>,
    ) -> ReportInputs {
        ReportInputs {
            title: REPORT_TITLE.to_string(),
            kpis: self.kpis.clone(),
            kpi_rows: kpi_table_rows(&self.kpis),
            top_products: top_products_by_revenue(&self.transactions, DEFAULT_TOP_PRODUCTS),
            daily_revenue: daily_revenue_series(&self.transactions),
            top_products_png,
            daily_revenue_png,
            insights: self.insights.clone(),
        }
    }

    fn replace_table(&mut self, table: TransactionTable) {
        self.transactions = table;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.kpis = compute_kpis(&self.transactions);
        self.insights = None;
    }
}
