//! Provider selection: a closed set of concrete clients behind one uniform
//! interface, plus an `Auto` mode that adopts the first available backend.

use log::info;

use crate::error::{Result, RetailInsightsError};
use crate::llm::gemini::GeminiProvider;
use crate::llm::openai::OpenAiProvider;
use crate::llm::types::{BusinessInsights, ProviderConfig, ProviderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    /// Try the priority list and adopt the first available provider.
    Auto,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
            Self::Auto => "Auto",
        }
    }
}

enum ProviderImpl {
    OpenAi(OpenAiProvider),
    Gemini(GeminiProvider),
}

/// Unified insight client over the concrete providers.
///
/// An explicit provider choice always constructs, operating in mock mode
/// when unavailable. `Auto` tries Gemini, then OpenAI (the cheaper/faster
/// tier first), and fails with a configuration error when neither holds a
/// credential.
pub struct InsightClient {
    inner: ProviderImpl,
}

impl InsightClient {
    pub fn new(kind: ProviderKind, config: &ProviderConfig) -> Result<Self> {
        match kind {
            ProviderKind::OpenAi => Ok(Self {
                inner: ProviderImpl::OpenAi(OpenAiProvider::new(config)),
            }),
            ProviderKind::Gemini => Ok(Self {
                inner: ProviderImpl::Gemini(GeminiProvider::new(config)),
            }),
            ProviderKind::Auto => Self::auto_select(config),
        }
    }

    /// Construct from environment credentials alone.
    pub fn from_env(kind: ProviderKind) -> Result<Self> {
        Self::new(kind, &ProviderConfig::default())
    }

    fn auto_select(config: &ProviderConfig) -> Result<Self> {
        let gemini = GeminiProvider::new(config);
        if gemini.is_available() {
            info!("auto-selected Gemini provider (model {})", gemini.model());
            return Ok(Self {
                inner: ProviderImpl::Gemini(gemini),
            });
        }

        let openai = OpenAiProvider::new(config);
        if openai.is_available() {
            info!("auto-selected OpenAI provider (model {})", openai.model());
            return Ok(Self {
                inner: ProviderImpl::OpenAi(openai),
            });
        }

        Err(RetailInsightsError::NoProviderCredentials)
    }

    pub fn provider_name(&self) -> &'static str {
        match &self.inner {
            ProviderImpl::OpenAi(_) => "OpenAI",
            ProviderImpl::Gemini(_) => "Gemini",
        }
    }

    pub fn model(&self) -> &str {
        match &self.inner {
            ProviderImpl::OpenAi(provider) => provider.model(),
            ProviderImpl::Gemini(provider) => provider.model(),
        }
    }

    pub fn is_available(&self) -> bool {
        match &self.inner {
            ProviderImpl::OpenAi(provider) => provider.is_available(),
            ProviderImpl::Gemini(provider) => provider.is_available(),
        }
    }

    pub fn availability_status(&self) -> ProviderStatus {
        match &self.inner {
            ProviderImpl::OpenAi(provider) => provider.availability_status(),
            ProviderImpl::Gemini(provider) => provider.availability_status(),
        }
    }

    pub async fn generate_business_insights(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<BusinessInsights> {
        match &self.inner {
            ProviderImpl::OpenAi(provider) => {
                provider.generate_business_insights(prompt, temperature).await
            }
            ProviderImpl::Gemini(provider) => {
                provider.generate_business_insights(prompt, temperature).await
            }
        }
    }

    pub async fn transcribe_audio(&self, file_bytes: &[u8], filename: &str) -> (String, bool) {
        match &self.inner {
            ProviderImpl::OpenAi(provider) => provider.transcribe_audio(file_bytes, filename).await,
            ProviderImpl::Gemini(provider) => provider.transcribe_audio(file_bytes, filename).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::mock_insights;

    fn no_credentials() -> ProviderConfig {
        ProviderConfig::default().with_api_key("")
    }

    #[test]
    fn test_explicit_choice_constructs_without_credential() {
        let client = InsightClient::new(ProviderKind::OpenAi, &no_credentials()).unwrap();
        assert_eq!(client.provider_name(), "OpenAI");
        assert!(!client.is_available());
        assert!(client.availability_status().using_mock);
    }

    #[test]
    fn test_auto_fails_without_any_credential() {
        let err = match InsightClient::new(ProviderKind::Auto, &no_credentials()) {
            Ok(_) => panic!("auto selection must fail without credentials"),
            Err(err) => err,
        };
        assert!(matches!(err, RetailInsightsError::NoProviderCredentials));
        // The error names both credential variables for the operator.
        let message = err.to_string();
        assert!(message.contains("GEMINI_API_KEY"));
        assert!(message.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_auto_prefers_gemini() {
        let client =
            InsightClient::new(ProviderKind::Auto, &no_credentials().with_api_key("key-123"))
                .unwrap();
        assert_eq!(client.provider_name(), "Gemini");
        assert!(client.is_available());
    }

    #[test]
    fn test_provider_kind_names() {
        assert_eq!(ProviderKind::Auto.name(), "Auto");
        assert_eq!(ProviderKind::Gemini.name(), "Gemini");
        assert_eq!(ProviderKind::OpenAi.name(), "OpenAI");
    }

    #[tokio::test]
    async fn test_unavailable_client_serves_mock() {
        let client = InsightClient::new(ProviderKind::Gemini, &no_credentials()).unwrap();
        let insights = client
            .generate_business_insights("prompt", 0.2)
            .await
            .unwrap();
        assert_eq!(insights, mock_insights());
    }
}
