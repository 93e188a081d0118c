use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetailInsightsError {
    #[error("Unable to read CSV: {0}")]
    CsvRead(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider response error: {0}")]
    ProviderResponse(String),

    #[error("Provider {0} is not available. Check the API key and network connection")]
    ProviderUnavailable(String),

    #[error("No AI credentials found. Set GEMINI_API_KEY or OPENAI_API_KEY in the environment")]
    NoProviderCredentials,
}

pub type Result<T> = std::result::Result<T, RetailInsightsError>;
