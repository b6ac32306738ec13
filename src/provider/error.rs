use thiserror::Error;

/// Errors returned by translation providers.
///
/// All of them are recoverable at leaf granularity except
/// [`ProviderError::MissingCredentials`] and [`ProviderError::Config`], which are
/// raised while constructing a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),

    #[error("provider configuration error: {0}")]
    Config(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("translation failed: {0}")]
    Translation(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited(_) | ProviderError::Network(_) => true,
            ProviderError::Http { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
