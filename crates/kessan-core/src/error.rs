use thiserror::Error;

/// Failure of a provider lookup. The whole bundle fails together; there is no partial
/// result.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no data for the requested symbol.
    #[error("{0}")]
    NotFound(String),

    /// The provider refused the request parameters (e.g. an unsupported period).
    #[error("{0}")]
    Rejected(String),

    /// Transport failures, unexpected statuses and unreadable payloads.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl ProviderError {
    pub fn upstream<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        ProviderError::Upstream(err.into())
    }
}
