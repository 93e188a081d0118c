//! Gemini-backed provider: `generateContent` with JSON-shaped output for
//! insight generation, inline audio parts for transcription.

use std::env;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetailInsightsError};
use crate::llm::mock::{mock_insights, mock_transcript};
use crate::llm::types::{BusinessInsights, ProviderConfig, ProviderStatus};
use crate::llm::utils::send_with_retry;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TRANSCRIPTION_PROMPT: &str = "Transcribe the attached audio recording and provide a short \
    business summary. Focus on retail insights, sales data, customer feedback, or operational \
    observations. Keep the response concise and business-focused.";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Client over the Gemini API. Same availability rules as the OpenAI
/// provider: credential + HTTP handle + not force-mocked, decided once at
/// construction.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    force_mock: bool,
    require_live: bool,
    http: Option<Client>,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default()
            .trim()
            .to_string();
        let model = config
            .model
            .clone()
            .or_else(|| env::var("GEMINI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let http = if !api_key.is_empty() && !config.force_mock {
            Client::builder().timeout(config.timeout).build().ok()
        } else {
            None
        };

        Self {
            api_key,
            model,
            force_mock: config.force_mock,
            require_live: config.require_live,
            http,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty() && self.http.is_some() && !self.force_mock
    }

    pub fn availability_status(&self) -> ProviderStatus {
        ProviderStatus {
            provider: "Gemini".to_string(),
            model: self.model.clone(),
            has_api_key: !self.api_key.is_empty(),
            backend_ready: self.http.is_some(),
            using_mock: !self.is_available(),
        }
    }

    /// Generate insights at the given sampling temperature. The request asks
    /// for `application/json` output shaped by the [`BusinessInsights`]
    /// schema; unavailability and any failure degrade to the canned mock
    /// object unless `require_live` is set.
    pub async fn generate_business_insights(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<BusinessInsights> {
        let Some(http) = self.http.as_ref().filter(|_| self.is_available()) else {
            return self.degrade("not available", None);
        };
        match self.request_insights(http, prompt, temperature).await {
            Ok(insights) => Ok(insights),
            Err(err) => self.degrade("insight request failed", Some(err)),
        }
    }

    async fn request_insights(
        &self,
        http: &Client,
        prompt: &str,
        temperature: f32,
    ) -> Result<BusinessInsights> {
        let payload = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: Some(GenerationConfig {
                temperature,
                top_p: 0.8,
                top_k: 40,
                max_output_tokens: 2048,
                response_mime_type: "application/json".to_string(),
                response_schema: Some(insights_response_schema()),
            }),
        };

        let url = self.generate_url();
        let response = send_with_retry(|| http.post(&url).json(&payload)).await?;
        let text = read_response_text(response).await?;

        let insights = BusinessInsights::from_json_text(&text)?;
        if insights.is_empty() {
            return Err(RetailInsightsError::ProviderResponse(
                "Gemini returned an empty insights object".to_string(),
            ));
        }
        Ok(insights)
    }

    /// Transcribe audio by attaching it as an inline part. Returns the
    /// transcript and whether a live backend produced it; every failure path
    /// yields the mock transcript and `false`.
    pub async fn transcribe_audio(&self, file_bytes: &[u8], filename: &str) -> (String, bool) {
        let Some(http) = self.http.as_ref().filter(|_| self.is_available()) else {
            return (mock_transcript().to_string(), false);
        };
        match self.request_transcript(http, file_bytes, filename).await {
            Ok(text) if !text.trim().is_empty() => (text, true),
            Ok(_) => (mock_transcript().to_string(), false),
            Err(err) => {
                warn!("Gemini transcription failed, serving mock transcript: {err}");
                (mock_transcript().to_string(), false)
            }
        }
    }

    async fn request_transcript(
        &self,
        http: &Client,
        file_bytes: &[u8],
        filename: &str,
    ) -> Result<String> {
        let mime_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string();
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: BASE64.encode(file_bytes),
                        },
                    },
                    Part::Text {
                        text: TRANSCRIPTION_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: None,
        };

        let response = http.post(self.generate_url()).json(&payload).send().await?;
        read_response_text(response).await
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn degrade(
        &self,
        context: &str,
        err: Option<RetailInsightsError>,
    ) -> Result<BusinessInsights> {
        if self.require_live {
            return Err(err
                .unwrap_or_else(|| RetailInsightsError::ProviderUnavailable("Gemini".to_string())));
        }
        warn!("Gemini provider {context}, serving mock insights");
        Ok(mock_insights())
    }
}

/// JSON Schema for the insights object, sent as the response schema so the
/// backend returns the exact shape the crate deserializes.
pub fn insights_response_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(BusinessInsights);
    serde_json::to_value(schema.schema).unwrap_or_default()
}

async fn read_response_text(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let err_text = response.text().await.unwrap_or_default();
        return Err(RetailInsightsError::ProviderResponse(format!(
            "Gemini API error (status {status}): {err_text}"
        )));
    }

    let body: GenerateContentResponse = response.json().await?;
    let text = body
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|candidate| {
            candidate
                .content
                .parts
                .into_iter()
                .filter_map(|part| match part {
                    Part::Text { text } => Some(text),
                    Part::InlineData { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(RetailInsightsError::ProviderResponse(
            "Gemini returned no text candidates".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user_text(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
