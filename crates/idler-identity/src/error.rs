//! Error types for the identity layer.

/// Errors raised while establishing an identity session.
///
/// Ticket issuance failure is not an error here: the provider reports it
/// the same way the underlying service does, with an empty ticket.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No communication pipe to the identity service could be created.
    #[error("identity pipe could not be created: {0}")]
    PipeUnavailable(String),

    /// The local user could not be attached to the pipe.
    #[error("identity user could not be created: {0}")]
    UserUnavailable(String),
}
