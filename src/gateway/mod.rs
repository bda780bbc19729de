//! Tracker service gateway
//!
//! Every call to the backing REST service goes through [`HttpGateway`],
//! which attaches the bearer credential and normalizes failures.

pub mod api;
pub mod auth;
pub mod client;

use thiserror::Error;

pub use api::TrackerApi;
pub use client::{Access, HttpGateway};

/// Gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The service rejected the credential (or none was stored)
    #[error("Session expired")]
    AuthExpired,

    /// Login refused the username/password pair
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No response was received
    #[error("Network error: {0}")]
    NetworkFailure(String),

    /// The service answered with a non-auth error status
    #[error("Server rejected request ({status}): {body}")]
    ServerRejected { status: u16, body: String },

    /// A success response whose body could not be used
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Body of a client-error rejection, shown verbatim on registration.
    pub fn rejection_body(&self) -> Option<&str> {
        match self {
            GatewayError::ServerRejected { status, body }
                if (400..500).contains(status) && !body.trim().is_empty() =>
            {
                Some(body.as_str())
            }
            _ => None,
        }
    }
}
