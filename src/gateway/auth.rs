//! Login and registration.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{Access, GatewayError, HttpGateway};
use crate::exercises::{Credential, Registration, UserId};

/// Login/registration body. The service takes the plain password in its
/// `passwordHash` field and hashes it server-side.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    username: &'a str,
    password_hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    id: Option<UserId>,
    username: Option<String>,
}

impl LoginResponse {
    fn into_credential(self) -> Result<Credential, GatewayError> {
        match (self.token, self.id, self.username) {
            (Some(token), Some(id), Some(username)) if !token.is_empty() => {
                Ok(Credential::new(token, id, username))
            }
            _ => Err(GatewayError::MalformedResponse(
                "Authentication data missing".to_string(),
            )),
        }
    }
}

impl HttpGateway {
    /// Exchange a username and password for a credential and store it in
    /// the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, GatewayError> {
        let body = AuthRequest {
            username,
            password_hash: password,
        };

        let response: LoginResponse = self.post_json("/login", &body, Access::Public).await?;
        let credential = response.into_credential()?;

        self.session().login(
            credential.token.clone(),
            credential.user_id,
            credential.username.clone(),
        );

        Ok(credential)
    }

    /// Create an account. A 4xx answer carries the reason in its body.
    pub async fn register(&self, registration: &Registration) -> Result<(), GatewayError> {
        let body = AuthRequest {
            username: &registration.username,
            password_hash: &registration.password,
        };

        self.send_discarding(Method::POST, "/register", Some(&body), Access::Public)
            .await?;
        tracing::info!("Registered {}", registration.username);

        Ok(())
    }
}
