use thiserror::Error;

/// Startup configuration failures. Any of these stops the process before
/// the poll loop is entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),
}

/// Recoverable failures of a single poll iteration.
///
/// Values are compared structurally by the poll loop to suppress repeated
/// notifications about the same failure, so every variant carries only
/// owned, comparable data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned HTTP {status}, expected 200")]
    UnsuccessfulStatus { status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

impl PollError {
    /// Whether the failure happened before a usable response was obtained.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PollError::Transport(_) | PollError::UnsuccessfulStatus { .. } | PollError::Decode(_)
        )
    }
}
