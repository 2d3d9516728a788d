use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a call to `esp_service`.
///
/// Serialisable so it survives the trip through a server function and the
/// web view can still tell an auth rejection from a network hiccup.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EspError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service answered with status {0}")]
    Status(u16),

    #[error("access key rejected (status {0})")]
    Auth(u16),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("no access key configured")]
    MissingKey,
}

impl EspError {
    /// Classify a non-2xx status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => EspError::Auth(status),
            other => EspError::Status(other),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, EspError::Auth(_))
    }
}

pub type EspResult<T> = Result<T, EspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_401_and_403_are_auth_errors() {
        assert!(EspError::from_status(401).is_auth());
        assert!(EspError::from_status(403).is_auth());
        assert_eq!(EspError::from_status(404), EspError::Status(404));
        assert!(!EspError::from_status(500).is_auth());
        assert!(!EspError::Transport("timeout".into()).is_auth());
    }
}
