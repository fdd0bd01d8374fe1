#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A signed request was attempted without a valid session token.
    #[error("unable to complete the signed request because the user was not authenticated")]
    NotAuthenticated,

    /// The raw response body could not be decoded into a structured value.
    #[error("invalid response format")]
    InvalidResponseFormat,

    /// The provider's payload itself signals an error condition.
    #[error("{message}")]
    Provider { code: u16, message: String },

    /// Network / transport error from the HTTP client.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// The request target could not be parsed as a URL.
    #[error("invalid request URL: {url}")]
    InvalidUrl { url: String },
}

impl Error {
    /// Numeric classification of the failure. `NotAuthenticated` maps to
    /// 401; provider-reported errors carry the provider's code; everything
    /// else is a 500-equivalent.
    pub fn code(&self) -> u16 {
        match self {
            Error::NotAuthenticated => 401,
            Error::Provider { code, .. } => *code,
            Error::InvalidResponseFormat | Error::Transport(_) | Error::InvalidUrl { .. } => 500,
        }
    }
}
