//! Error types for the room client

/// Result type alias using the room client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a room session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connect attempted without a server URL or access token
    #[error("URL and Token are required.")]
    MissingCredentials,

    /// The media library rejected the connection attempt
    ///
    /// Adapters map signaling and join failures onto this and the other
    /// library-facing variants below.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connect did not complete within `connect_timeout_ms`
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Local capture device or track publishing error
    #[error("Media error: {0}")]
    MediaError(String),

    /// Mute, unmute or subscription change on a track failed
    #[error("Media track error: {0}")]
    MediaTrackError(String),

    /// Remote participant is no longer part of the room
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// Operation requires an active room connection
    #[error("Not connected to a room")]
    NotConnected,

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data (unknown track kind, malformed input)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Any other failure reported by the media library
    #[error("{0}")]
    Backend(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if retrying the same operation might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailed(_) | Error::Timeout(_) | Error::Backend(_) | Error::IoError(_)
        )
    }

    /// Check if this error was caused by user input or configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::MissingCredentials | Error::InvalidConfig(_) | Error::InvalidData(_)
        )
    }

    /// Human-readable cause without the variant prefix, used in status messages
    ///
    /// The status line already says what failed ("Connection failed: ...",
    /// "Media Error: ..."), so wrapping library variants only contribute
    /// their inner text.
    pub fn reason(&self) -> String {
        match self {
            Error::ConnectionFailed(reason)
            | Error::MediaError(reason)
            | Error::MediaTrackError(reason)
            | Error::Backend(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_message() {
        assert_eq!(
            Error::MissingCredentials.to_string(),
            "URL and Token are required."
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::Timeout("signal connect".to_string());
        assert_eq!(err.to_string(), "Timeout: signal connect");

        let err = Error::Backend("room closed".to_string());
        assert_eq!(err.to_string(), "room closed");
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(Error::Timeout("x".to_string()).is_retryable());
        assert!(Error::ConnectionFailed("x".to_string()).is_retryable());
        assert!(!Error::MissingCredentials.is_retryable());
        assert!(!Error::InvalidConfig("x".to_string()).is_retryable());
    }

    #[test]
    fn test_error_is_config_error() {
        assert!(Error::MissingCredentials.is_config_error());
        assert!(Error::InvalidData("kind".to_string()).is_config_error());
        assert!(!Error::NotConnected.is_config_error());
    }

    #[test]
    fn test_error_reason_strips_prefix() {
        assert_eq!(
            Error::ConnectionFailed("server unavailable".to_string()).reason(),
            "server unavailable"
        );
        assert_eq!(
            Error::MediaError("no capture device".to_string()).reason(),
            "no capture device"
        );
        assert_eq!(
            Error::Timeout("no answer".to_string()).reason(),
            "Timeout: no answer"
        );
        assert_eq!(Error::NotConnected.reason(), "Not connected to a room");
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(Error::from(json_err), Error::SerializationError(_)));
    }
}
