//! # Retail Insights
//!
//! Core pipeline for a retail-analytics dashboard: normalize loosely-
//! structured point-of-sale CSVs into a canonical transaction table, reduce
//! the table to KPI summaries, and request structured business commentary
//! from interchangeable text-generation providers with a deterministic mock
//! fallback.
//!
//! ## Core Concepts
//!
//! - **Normalization**: arbitrary source headers are mapped onto one
//!   canonical schema through ordered alias lists; malformed cells degrade to
//!   defaults instead of rejecting rows.
//! - **KPIs**: pure, order-invariant reductions (total revenue, order count,
//!   average order value, top product/category).
//! - **Providers**: Gemini and OpenAI clients behind one interface.
//!   Availability is decided once at construction; failures degrade to a
//!   canned mock insights object so the dashboard keeps rendering.
//! - **Session**: an explicit state struct owned by the dashboard shell; the
//!   pipeline functions themselves are stateless.
//!
//! ## Example
//!
//! ```rust,ignore
//! use retail_insights::{DashboardSession, InsightClient, ProviderKind};
//!
//! let client = InsightClient::from_env(ProviderKind::Auto)?;
//! let mut session = DashboardSession::new(client);
//!
//! session.load_csv_bytes(&std::fs::read("shop_sample.csv")?)?;
//! println!("revenue: {}", session.kpis().total_revenue);
//!
//! let insights = session.refresh_insights(0.2).await?;
//! println!("{}", insights.executive_summary_en);
//! ```

pub mod error;
pub mod kpi;
pub mod llm;
pub mod normalize;
pub mod payload;
pub mod report;
pub mod sample;
pub mod session;

pub use error::{RetailInsightsError, Result};
pub use kpi::*;
pub use llm::*;
pub use normalize::*;
pub use payload::*;
pub use report::*;
pub use sample::*;
pub use session::*;

use log::info;

/// Load CSV bytes and compute KPIs in one step, the shape of the "file
/// upload" dashboard action.
pub fn analyze_csv(bytes: &[u8]) -> Result<(TransactionTable, KpiSummary)> {
    let table = normalize::load_transactions_from_csv(bytes)?;
    let kpis = kpi::compute_kpis(&table);
    info!(
        "analyzed {} transactions, total revenue {:.2}",
        table.len(),
        kpis.total_revenue
    );
    Ok((table, kpis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[tokio::test]
    async fn test_end_to_end_pipeline_with_mock_provider() {
        let csv_text = sample::generate_scenario_csv(
            sample::SampleScenario::NormalWeek,
            &mut StdRng::seed_from_u64(11),
        );

        let (table, kpis) = analyze_csv(csv_text.as_bytes()).unwrap();
        assert!(!table.is_empty());
        assert!(kpis.total_orders >= 140);

        let payload = build_insight_payload(&table, &kpis, DEFAULT_SAMPLE_ROWS);
        let prompt = build_insights_prompt(&payload);
        assert!(prompt.contains("sample_rows"));

        let config = ProviderConfig::default().with_api_key("");
        let client = InsightClient::new(ProviderKind::OpenAi, &config).unwrap();
        let insights = client
            .generate_business_insights(&prompt, 0.2)
            .await
            .unwrap();
        assert!(!insights.executive_summary_en.is_empty());
    }
}
