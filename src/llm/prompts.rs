//! Prompt construction for the insight-generation request.

/// Wrap the serialized `{kpis, sample_rows}` payload in a strict-JSON
/// instruction. The recognized response keys mirror
/// [`BusinessInsights`](crate::llm::types::BusinessInsights).
pub fn build_insights_prompt(data_json: &str) -> String {
    let schema_note = "Return STRICT JSON with keys: executive_summary_en, executive_summary_hi, \
        recommendations (array of strings), recommendations_hi (array of strings), \
        kpi_commentary (object), kpi_commentary_hi (object), risks (array), opportunities (array).";
    format!(
        "You are an expert retail analyst. Analyze the following JSON data and provide actionable, \
        concise insights. Use an upbeat but professional tone. {schema_note}\n\nDATA:\n{data_json}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_payload_and_schema_note() {
        let prompt = build_insights_prompt(r#"{"kpis": {}}"#);
        assert!(prompt.contains("STRICT JSON"));
        assert!(prompt.contains("executive_summary_hi"));
        assert!(prompt.ends_with(r#"{"kpis": {}}"#));
    }
}
