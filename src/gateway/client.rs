//! HTTP client for the tracker service.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::GatewayError;
use crate::session::SessionStore;
use crate::storage::config::ApiSettings;

/// How a 401 answer is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Requires the bearer credential; 401 means the session expired
    Authorized,
    /// Login and registration; 401 means the submitted credentials were wrong
    Public,
}

/// Gateway to the tracker REST service.
///
/// Attaches `Authorization: Bearer <token>` whenever the session holds a
/// credential. Never retries; an unauthorized answer invalidates the
/// session once and surfaces [`GatewayError::AuthExpired`].
pub struct HttpGateway {
    /// HTTP client
    http: reqwest::Client,
    /// Base URL without a trailing slash
    base_url: String,
    /// Credential source and expiry policy
    session: Arc<SessionStore>,
}

impl HttpGateway {
    /// Create a gateway without a request timeout.
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Result<Self, GatewayError> {
        Self::build(base_url.into(), None, session)
    }

    /// Create a gateway from configuration.
    pub fn from_settings(
        settings: &ApiSettings,
        session: Arc<SessionStore>,
    ) -> Result<Self, GatewayError> {
        let timeout = settings.request_timeout_secs.map(Duration::from_secs);
        Self::build(settings.base_url.clone(), timeout, session)
    }

    fn build(
        base_url: String,
        timeout: Option<Duration>,
        session: Arc<SessionStore>,
    ) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| GatewayError::NetworkFailure(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// The session this gateway authenticates with.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode a JSON body.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, GatewayError> {
        let response = self.send(Method::GET, path, None::<&()>, Access::Authorized).await?;
        decode(response).await
    }

    /// POST a JSON body to `path` and decode the JSON answer.
    pub async fn post_json<T, R>(&self, path: &str, body: &T, access: Access) -> Result<R, GatewayError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body), access).await?;
        decode(response).await
    }

    /// Send a request whose answer body is not needed.
    pub async fn send_discarding<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
        access: Access,
    ) -> Result<(), GatewayError>
    where
        T: Serialize + ?Sized,
    {
        self.send(method, path, body, access).await.map(|_| ())
    }

    /// Send a request and map the status to the gateway error taxonomy.
    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
        access: Access,
    ) -> Result<Response, GatewayError>
    where
        T: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let (request, token) = self.authorize(request);

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(self.unauthorized(access, token.as_deref()));
        }

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Failed to read {} rejection body: {}", url, e);
                    String::new()
                }
            };
            tracing::debug!("{} rejected with {}", url, status);
            return Err(GatewayError::ServerRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Attach the current bearer token, returning the token that was used.
    fn authorize(&self, request: RequestBuilder) -> (RequestBuilder, Option<String>) {
        match self.session.current_credential() {
            Some(credential) => (request.bearer_auth(&credential.token), Some(credential.token)),
            None => (request, None),
        }
    }

    fn unauthorized(&self, access: Access, token: Option<&str>) -> GatewayError {
        match access {
            Access::Public => GatewayError::InvalidCredentials,
            Access::Authorized => {
                if let Some(token) = token {
                    if self.session.invalidate(token) {
                        tracing::warn!("Forced logout after unauthorized response");
                    }
                }
                GatewayError::AuthExpired
            }
        }
    }
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, GatewayError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::NetworkFailure(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
}
