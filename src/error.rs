//! Error types for fabriclink

use std::fmt;

/// Crate-wide error type. Every failure is wrapped with a descriptive
/// message at the boundary where it is caught; the message carries all
/// context, so `Display` prints it verbatim. Callers match on message
/// prefixes, not on variants, when they care about a specific failure.
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Profile load/parse/validation failures.
    Config(String),
    /// Admin session lookup failures.
    Session(String),
    /// SDK and system-client construction failures.
    Client(String),
    /// Channel assembly failures (fetch, construct, attach).
    Assembly(String),
    /// Channel lifecycle failures (join-check, create/update, initialize, join).
    Lifecycle(String),
    /// Event-hub failures (construction, peer-not-found, connect).
    EventHub(String),
    /// Transport-level failures reported by the ledger network.
    Network(String),
    IoError(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "{}", msg),
            ClientError::Session(msg) => write!(f, "{}", msg),
            ClientError::Client(msg) => write!(f, "{}", msg),
            ClientError::Assembly(msg) => write!(f, "{}", msg),
            ClientError::Lifecycle(msg) => write!(f, "{}", msg),
            ClientError::EventHub(msg) => write!(f, "{}", msg),
            ClientError::Network(msg) => write!(f, "{}", msg),
            ClientError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::IoError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_message_is_printed_verbatim() {
        let err = ClientError::Session("failed getting admin user session for org Org1: user not found".to_string());
        assert!(err
            .to_string()
            .starts_with("failed getting admin user session for org"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such profile");
        let err: ClientError = io_err.into();
        assert!(err.to_string().contains("no such profile"));
    }
}
