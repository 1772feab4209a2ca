use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Coarse classification of every failure the core can report.
///
/// Every kind is fatal for a single invocation; the kind only decides the
/// message prefix and the process exit status chosen by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Authentication,
    Authorization,
    Decode,
    Vault,
    NotAuthenticated,
    Output,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request rejected: {0}")]
    Authorization(String),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Credential store error: {0}")]
    Vault(#[from] keyring::Error),

    #[error("Not logged in - run a login first")]
    NotAuthenticated,

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Authorization(_) => ErrorKind::Authorization,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Vault(_) => ErrorKind::Vault,
            Error::NotAuthenticated => ErrorKind::NotAuthenticated,
            Error::Output(_) => ErrorKind::Output,
        }
    }

    /// Process exit status for this error. Configuration problems are
    /// reported as usage errors, everything else as a generic failure.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Configuration => 2,
            _ => 1,
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Non-success answer from the identity provider's token endpoint.
    pub fn from_token_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = Self::truncate_body(body);
        if body.is_empty() {
            Error::Authentication(status.to_string())
        } else {
            Error::Authentication(format!("{}: {}", status, body))
        }
    }

    /// Non-success answer from the service API. 401 is not singled out:
    /// an expired token and any other rejection abort the same way.
    pub fn from_api_status(status: reqwest::StatusCode) -> Self {
        Error::Authorization(status.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
