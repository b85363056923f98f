//! Signup Service REST Client
//!
//! HTTP client for the signup service. The session lives in a cookie, so the
//! underlying `reqwest` client keeps a cookie jar for its whole lifetime.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use uuid::Uuid;

use super::dto::{ActionReply, AuthStatus, Credentials, ErrorDetail, LoginReply, Roster};
use super::error::{ApiError, ApiResult};
use super::SignupApi;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Signup service REST client
pub struct HttpSignupApi {
    client: Client,
    base_url: String,
}

impl HttpSignupApi {
    /// Create a client for the service at `base_url`.
    ///
    /// Every request is bounded by `request_timeout`; a request that runs
    /// past it fails with [`ApiError::Timeout`].
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request tagged with a fresh request id
    async fn send(&self, request: RequestBuilder, op: &'static str) -> ApiResult<Response> {
        let request_id = Uuid::new_v4();
        tracing::debug!(request_id = %request_id, op, "Sending request");

        request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(|e| {
                let err = ApiError::from(e);
                tracing::warn!(request_id = %request_id, op, error = %err, "Request did not complete");
                err
            })
    }

    /// Read the body, turning a non-success status into a rejection
    async fn read(response: Response) -> ApiResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(rejection(status, &body))
        }
    }
}

fn rejection(status: StatusCode, body: &str) -> ApiError {
    ApiError::Rejected {
        status: status.as_u16(),
        detail: ErrorDetail::from_body(body),
    }
}

/// Request target for a signup, with both identifiers percent-encoded
pub fn signup_path(activity: &str, email: &str) -> String {
    format!(
        "/activities/{}/signup?email={}",
        urlencoding::encode(activity),
        urlencoding::encode(email)
    )
}

/// Request target for an unregister, with both identifiers percent-encoded
pub fn unregister_path(activity: &str, email: &str) -> String {
    format!(
        "/activities/{}/unregister?email={}",
        urlencoding::encode(activity),
        urlencoding::encode(email)
    )
}

/// Parse an action reply; success bodies without a message are still success.
fn lenient_reply<T: serde::de::DeserializeOwned + Default>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_default()
}

#[async_trait(?Send)]
impl SignupApi for HttpSignupApi {
    async fn auth_status(&self) -> ApiResult<AuthStatus> {
        let response = self
            .send(self.client.get(self.url("/auth/status")), "auth_status")
            .await?;
        let body = Self::read(response).await?;

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginReply> {
        let response = self
            .send(
                self.client.post(self.url("/login")).json(credentials),
                "login",
            )
            .await?;
        let body = Self::read(response).await?;

        Ok(lenient_reply(&body))
    }

    async fn logout(&self) -> ApiResult<()> {
        let response = self
            .send(self.client.post(self.url("/logout")), "logout")
            .await?;
        Self::read(response).await?;

        Ok(())
    }

    async fn activities(&self) -> ApiResult<Roster> {
        let response = self
            .send(self.client.get(self.url("/activities")), "activities")
            .await?;
        let body = Self::read(response).await?;

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn signup(&self, activity: &str, email: &str) -> ApiResult<ActionReply> {
        let url = self.url(&signup_path(activity, email));
        let response = self.send(self.client.post(url), "signup").await?;
        let body = Self::read(response).await?;

        Ok(lenient_reply(&body))
    }

    async fn unregister(&self, activity: &str, email: &str) -> ApiResult<ActionReply> {
        let url = self.url(&unregister_path(activity, email));
        let response = self.send(self.client.delete(url), "unregister").await?;
        let body = Self::read(response).await?;

        Ok(lenient_reply(&body))
    }
}
