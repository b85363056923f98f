//! # Rollcall
//!
//! A terminal client for a school's extracurricular activity signup service.
//! Anyone can browse activities and their participants; a signed-in teacher
//! can register and unregister students.
//!
//! ## Modules
//!
//! - [`api`]: HTTP client for the signup service and its wire types
//! - [`view`]: The page model every component renders into
//! - [`session`]: Teacher session and gating of privileged controls
//! - [`roster`]: Activity list rendering
//! - [`dispatcher`]: Login, logout, signup and unregister flows
//! - [`modal`]: Login dialog lifecycle
//! - [`feedback`]: Auto-expiring notices
//! - [`app`]: Wiring and bootstrap
//! - [`shell`]: Command parsing for the interactive front end
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::{App, AppSettings, HttpSignupApi, SignupApi};
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api: Rc<dyn SignupApi> =
//!         Rc::new(HttpSignupApi::new("http://localhost:8000", Duration::from_secs(30))?);
//!
//!     let app = App::new(api, AppSettings::default());
//!     app.start().await;
//!
//!     println!("{}", app.snapshot());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod dispatcher;
pub mod feedback;
pub mod modal;
pub mod roster;
pub mod session;
pub mod shell;
pub mod view;

// Re-export top-level types for convenience
pub use api::{ApiError, ApiResult, HttpSignupApi, SignupApi};

pub use app::{App, AppSettings, UiEvent};

pub use config::{Config, ConfigError, ConfigSearch, LoggingConfig};

pub use dispatcher::ActionOutcome;

pub use feedback::{Notice, NoticeTimings, Severity};

pub use session::{AuthError, Session};

pub use shell::{Command, ShellError, Step};

pub use view::{Document, Page};
