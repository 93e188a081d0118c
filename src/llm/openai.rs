//! OpenAI-backed provider: chat completions for insight generation and
//! Whisper for audio transcription.

use std::env;

use log::warn;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, RetailInsightsError};
use crate::llm::mock::{mock_insights, mock_transcript};
use crate::llm::types::{BusinessInsights, ProviderConfig, ProviderStatus};
use crate::llm::utils::send_with_retry;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const WHISPER_MODEL: &str = "whisper-1";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Client over the OpenAI API. Availability is decided once at construction:
/// a non-empty credential, a successfully built HTTP handle, and no forced
/// mock flag. A handle that fails to build demotes the instance to mock mode
/// instead of erroring.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    force_mock: bool,
    require_live: bool,
    http: Option<Client>,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default()
            .trim()
            .to_string();
        let model = config
            .model
            .clone()
            .or_else(|| env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

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
            base_url: OPENAI_BASE_URL.to_string(),
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
            provider: "OpenAI".to_string(),
            model: self.model.clone(),
            has_api_key: !self.api_key.is_empty(),
            backend_ready: self.http.is_some(),
            using_mock: !self.is_available(),
        }
    }

    /// Generate insights at the given sampling temperature. Unavailability
    /// and any network/parse failure degrade to the canned mock object
    /// unless the client was configured with `require_live`.
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
        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {
                    "role": "system",
                    "content": "You are a retail analytics assistant. Always reply with compact valid JSON.",
                },
                {"role": "user", "content": prompt},
            ],
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response =
            send_with_retry(|| http.post(&url).bearer_auth(&self.api_key).json(&body)).await?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            return Err(RetailInsightsError::ProviderResponse(format!(
                "OpenAI API error (status {status}): {err_text}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let insights = BusinessInsights::from_json_text(&content)?;
        if insights.is_empty() {
            return Err(RetailInsightsError::ProviderResponse(
                "OpenAI returned an empty insights object".to_string(),
            ));
        }
        Ok(insights)
    }

    /// Transcribe audio via Whisper. Returns the transcript and whether a
    /// live backend produced it; every failure path yields the mock
    /// transcript and `false`.
    pub async fn transcribe_audio(&self, file_bytes: &[u8], filename: &str) -> (String, bool) {
        let Some(http) = self.http.as_ref().filter(|_| self.is_available()) else {
            return (mock_transcript().to_string(), false);
        };
        match self.request_transcript(http, file_bytes, filename).await {
            Ok(text) if !text.trim().is_empty() => (text, true),
            Ok(_) => (mock_transcript().to_string(), false),
            Err(err) => {
                warn!("OpenAI transcription failed, serving mock transcript: {err}");
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
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = Part::bytes(file_bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().text("model", WHISPER_MODEL).part("file", part);

        let response = http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            return Err(RetailInsightsError::ProviderResponse(format!(
                "Whisper API error (status {status}): {err_text}"
            )));
        }

        let body: TranscriptionResponse = response.json().await?;
        Ok(body.text)
    }

    fn degrade(
        &self,
        context: &str,
        err: Option<RetailInsightsError>,
    ) -> Result<BusinessInsights> {
        if self.require_live {
            return Err(err
                .unwrap_or_else(|| RetailInsightsError::ProviderUnavailable("OpenAI".to_string())));
        }
        warn!("OpenAI provider {context}, serving mock insights");
        Ok(mock_insights())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}
