//! Signup Service API
//!
//! The client's only view of the remote source of truth.
//!
//! # Endpoints
//!
//! ## Session
//! - `GET /auth/status` - Current session
//! - `POST /login` - Open a session
//! - `POST /logout` - Close the session
//!
//! ## Roster
//! - `GET /activities` - All activities with participants
//! - `POST /activities/{name}/signup?email={email}` - Register a participant
//! - `DELETE /activities/{name}/unregister?email={email}` - Remove a participant
//!
//! Every operation is a single round trip; nothing is cached between calls.

pub mod client;
pub mod dto;
pub mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use client::HttpSignupApi;
pub use dto::{
    ActionReply, Activity, ActivityDetails, AuthStatus, Credentials, ErrorDetail, LoginReply,
    Roster,
};
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;

/// Round trips the client can make against the signup service.
///
/// Implementations are driven from a single-threaded executor, so the
/// futures they return need not be `Send`.
#[async_trait(?Send)]
pub trait SignupApi {
    /// Read-only session probe
    async fn auth_status(&self) -> ApiResult<AuthStatus>;

    /// Submit credentials
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginReply>;

    /// End the current session
    async fn logout(&self) -> ApiResult<()>;

    /// Fetch the full activity collection
    async fn activities(&self) -> ApiResult<Roster>;

    /// Register `email` for `activity`
    async fn signup(&self, activity: &str, email: &str) -> ApiResult<ActionReply>;

    /// Remove `email` from `activity`
    async fn unregister(&self, activity: &str, email: &str) -> ApiResult<ActionReply>;
}
