use thiserror::Error;

/// Errors returned by the trends web API client.
#[derive(Debug, Error)]
pub enum TrendsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by trends API at {url}")]
    RateLimited { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The explore response did not contain the widget needed for the
    /// requested view.
    #[error("explore response has no '{widget_id}' widget")]
    MissingWidget { widget_id: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
