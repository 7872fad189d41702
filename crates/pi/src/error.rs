/// Errors from the Pi platform layer.
#[derive(Debug, thiserror::Error)]
pub enum PiError {
    /// The HTTP request itself failed (network, DNS, TLS).
    #[error("Pi platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform returned a non-2xx status code.
    #[error("Pi platform error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The access token was rejected or the user is unknown.
    #[error("Pi authentication failed")]
    NotAuthenticated,

    /// The platform answered with something we could not use.
    #[error("Unexpected Pi platform response: {0}")]
    InvalidResponse(String),
}
