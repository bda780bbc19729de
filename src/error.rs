//! Crate-wide error type.

use thiserror::Error;

use crate::exercises::ValidationError;
use crate::gateway::GatewayError;

/// Errors surfaced to the interactive shell.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Rejected locally before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// No credential is stored
    #[error("Not signed in")]
    NotSignedIn,

    /// The service refused a registration and said why
    #[error("Registration rejected: {0}")]
    RegistrationRejected(String),
}

/// Result type for client operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

impl TrackerError {
    /// Whether the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            TrackerError::NotSignedIn | TrackerError::Gateway(GatewayError::AuthExpired)
        )
    }

    /// Map a failed registration. A client-error body is the service's
    /// explanation and is kept verbatim.
    pub fn registration(err: GatewayError) -> Self {
        match err.rejection_body() {
            Some(body) => TrackerError::RegistrationRejected(body.to_string()),
            None => TrackerError::Gateway(err),
        }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Validation(e) => e.to_string(),
            TrackerError::Gateway(GatewayError::AuthExpired) => {
                "Your session has expired. Please log in again.".to_string()
            }
            TrackerError::Gateway(GatewayError::InvalidCredentials) => {
                "Invalid username or password. Please try again.".to_string()
            }
            TrackerError::Gateway(_) => "Something went wrong. Please try again.".to_string(),
            TrackerError::NotSignedIn => "Please log in first.".to_string(),
            TrackerError::RegistrationRejected(reason) => reason.clone(),
        }
    }
}
