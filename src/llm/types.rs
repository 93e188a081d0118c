use std::collections::BTreeMap;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::utils::extract_json_block;

/// Structured commentary returned by a text-generation backend.
///
/// Only the two executive summaries are expected on every response; all other
/// keys are optional and default to empty. Consumers treat an empty field as
/// "no content", never as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BusinessInsights {
    #[serde(default)]
    #[schemars(description = "2-3 sentence summary of the business data, in English")]
    pub executive_summary_en: String,

    #[serde(default)]
    #[schemars(description = "The same summary, in Hindi")]
    pub executive_summary_hi: String,

    #[serde(default)]
    #[schemars(description = "3-5 concise, actionable recommendations in English")]
    pub recommendations: Vec<String>,

    #[serde(default)]
    #[schemars(description = "The recommendations translated to Hindi")]
    pub recommendations_hi: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Short commentary per KPI name, in English")]
    pub kpi_commentary: BTreeMap<String, String>,

    #[serde(default)]
    #[schemars(description = "Short commentary per KPI name, in Hindi")]
    pub kpi_commentary_hi: BTreeMap<String, String>,

    #[serde(default)]
    #[schemars(description = "Notable risks visible in the data")]
    pub risks: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Notable opportunities visible in the data")]
    pub opportunities: Vec<String>,
}

impl BusinessInsights {
    /// Parse a model response. Providers often wrap the JSON object in prose
    /// or code fences, so the outermost `{...}` block is extracted first.
    pub fn from_json_text(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(extract_json_block(raw))?)
    }

    /// A response that parsed but carried no content counts as a failed
    /// generation for fallback purposes.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Construction-time settings shared by both concrete providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Explicit credential. `None` reads the provider's environment variable.
    pub api_key: Option<String>,
    /// Explicit model override. `None` reads the env override, then the
    /// provider default.
    pub model: Option<String>,
    /// Force mock mode even when a credential is present.
    pub force_mock: bool,
    /// Propagate provider failures instead of degrading to mock output.
    pub require_live: bool,
    /// Request timeout on the HTTP client.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            force_mock: false,
            require_live: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_force_mock(mut self, force_mock: bool) -> Self {
        self.force_mock = force_mock;
        self
    }

    pub fn with_require_live(mut self, require_live: bool) -> Self {
        self.require_live = require_live;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Availability flags for one client instance, computable without a network
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub provider: String,
    pub model: String,
    pub has_api_key: bool,
    pub backend_ready: bool,
    pub using_mock: bool,
}
