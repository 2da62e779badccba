//! Unified error type for the idler client.

use idler_identity::IdentityError;
use idler_protocol::ProtocolError;
use idler_session::ConnectError;
use idler_transport::TransportError;

/// Top-level error wrapping every crate-specific error.
///
/// Session failures after start-up are not errors: they end in a terminal
/// `ConnectionState`. This type covers start-up, configuration and direct
/// use of the lower-level crates.
#[derive(Debug, thiserror::Error)]
pub enum IdlerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session could not be started.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The client configuration could not be parsed.
    #[error("invalid client configuration: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use idler_transport::SocketHandle;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::UnknownSocket(SocketHandle::new(4));
        let idler_err: IdlerError = err.into();
        assert!(matches!(idler_err, IdlerError::Transport(_)));
        assert!(idler_err.to_string().contains("sock-4"));
    }

    #[test]
    fn test_from_identity_error() {
        let err = IdentityError::PipeUnavailable("no client running".into());
        let idler_err: IdlerError = err.into();
        assert!(matches!(idler_err, IdlerError::Identity(_)));
        assert!(idler_err.to_string().contains("no client running"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::Truncated { len: 2 };
        let idler_err: IdlerError = err.into();
        assert!(matches!(idler_err, IdlerError::Protocol(_)));
    }

    #[test]
    fn test_from_connect_error() {
        let err = ConnectError::IdentityUnavailable(IdentityError::UserUnavailable(
            "logged out".into(),
        ));
        let idler_err: IdlerError = err.into();
        assert!(matches!(idler_err, IdlerError::Connect(_)));
    }

    #[test]
    fn test_from_json_error_is_config() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let idler_err: IdlerError = err.into();
        assert!(matches!(idler_err, IdlerError::Config(_)));
        assert!(idler_err.to_string().starts_with("invalid client configuration"));
    }
}
