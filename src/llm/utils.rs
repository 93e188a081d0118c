use crate::error::Result;

/// Extract the outermost JSON object from raw model output. Models wrap JSON
/// in code fences or prose often enough that parsing the raw text directly
/// loses otherwise-valid responses.
pub fn extract_json_block(raw: &str) -> &str {
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return &raw[start..=end];
        }
    }
    raw.trim()
}

/// Send a request, retrying exactly once on a transport-level failure
/// (connect error or timeout). HTTP-level error statuses are not retried.
pub async fn send_with_retry<F>(build: F) -> Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    match build().send().await {
        Ok(response) => Ok(response),
        Err(err) if err.is_timeout() || err.is_connect() => {
            log::debug!("retrying provider request after transport error: {err}");
            Ok(build().send().await?)
        }
        Err(err) => Err(err.into()),
    }
}
