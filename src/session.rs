//! Session Gate
//!
//! Owns the client's view of the authenticated session and derives the
//! enablement of every gated control from it. The session is only ever
//! changed here, and every change is followed by a gating pass over the page.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::api::{ApiError, ApiResult, Credentials, SignupApi};
use crate::view::{
    Control, Document, Header, Page, REMOVE_LOCKED_TITLE, REMOVE_TITLE, SIGNUP_LOCKED_TITLE,
};

/// Fallback reason when a login rejection carries no detail
pub const LOGIN_REJECTED_FALLBACK: &str = "Login failed";

/// Authentication state of this client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub username: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            username: Some(username.into()),
        }
    }
}

/// Login failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// The server refused the credentials; carries its reason or a fallback
    #[error("{0}")]
    Rejected(String),

    /// The login request never completed
    #[error("Login request failed: {0}")]
    Transport(#[source] ApiError),
}

/// Holds the session and gates privileged controls on it
pub struct SessionGate {
    api: Rc<dyn SignupApi>,
    document: Document,
    session: RefCell<Session>,
}

impl SessionGate {
    pub fn new(api: Rc<dyn SignupApi>, document: Document) -> Self {
        Self {
            api,
            document,
            session: RefCell::new(Session::anonymous()),
        }
    }

    /// Current session
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().authenticated
    }

    /// Ask the server for the session status.
    ///
    /// Fails closed: any error is logged and treated as signed out.
    pub async fn probe(&self) -> Session {
        let session = match self.api.auth_status().await {
            Ok(status) if status.authenticated => {
                Session::signed_in(status.username.unwrap_or_default())
            }
            Ok(_) => Session::anonymous(),
            Err(e) => {
                tracing::warn!(error = %e, "Session probe failed, treating client as signed out");
                Session::anonymous()
            }
        };

        self.replace(session.clone());
        session
    }

    /// Submit credentials and open a session on success
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let credentials = Credentials::new(username, password);

        match self.api.login(&credentials).await {
            Ok(reply) => {
                let username = reply.username.unwrap_or_else(|| username.to_string());
                tracing::info!(username = %username, "Signed in");

                let session = Session::signed_in(username);
                self.replace(session.clone());
                Ok(session)
            }
            Err(ApiError::Rejected { detail, .. }) => Err(AuthError::Rejected(
                detail.unwrap_or_else(|| LOGIN_REJECTED_FALLBACK.to_string()),
            )),
            Err(e) => Err(AuthError::Transport(e)),
        }
    }

    /// End the session. On failure the session is left exactly as it was.
    pub async fn logout(&self) -> ApiResult<()> {
        self.api.logout().await?;

        tracing::info!("Signed out");
        self.replace(Session::anonymous());
        Ok(())
    }

    /// Re-derive header and control enablement from the current session
    pub fn apply_gating(&self) {
        let session = self.session();
        self.document.update(|page| gate_page(page, &session));
    }

    fn replace(&self, session: Session) {
        *self.session.borrow_mut() = session;
        self.apply_gating();
    }
}

/// Enable every gated control iff `session` is authenticated.
///
/// Idempotent; safe to run after every render and every session change.
pub fn gate_page(page: &mut Page, session: &Session) {
    page.header = if session.authenticated {
        Header::UserInfo {
            username: session.username.clone().unwrap_or_default(),
        }
    } else {
        Header::LoginButton
    };

    page.signup_form.submit = if session.authenticated {
        Control::enabled("")
    } else {
        Control::disabled(SIGNUP_LOCKED_TITLE)
    };

    for row in page.activities.rows_mut() {
        row.remove = if session.authenticated {
            Control::enabled(REMOVE_TITLE)
        } else {
            Control::disabled(REMOVE_LOCKED_TITLE)
        };
    }
}
