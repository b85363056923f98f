//! In-memory signup service used by the client's unit tests.
//!
//! Behaves like a small server: it keeps its own roster and session, applies
//! signups and removals, and records every call it receives.

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use super::dto::{
    ActionReply, Activity, ActivityDetails, AuthStatus, Credentials, LoginReply, Roster,
};
use super::error::{ApiError, ApiResult};
use super::SignupApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    AuthStatus,
    Login,
    Logout,
    Activities,
    Signup,
    Unregister,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AuthStatus,
    Login { username: String },
    Logout,
    Activities,
    Signup { activity: String, email: String },
    Unregister { activity: String, email: String },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::AuthStatus => Op::AuthStatus,
            Call::Login { .. } => Op::Login,
            Call::Logout => Op::Logout,
            Call::Activities => Op::Activities,
            Call::Signup { .. } => Op::Signup,
            Call::Unregister { .. } => Op::Unregister,
        }
    }
}

pub struct FakeApi {
    activities: RefCell<Vec<Activity>>,
    signed_in: RefCell<Option<String>>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<HashMap<Op, ApiError>>,
    latency: Cell<Duration>,
    op_latency: RefCell<HashMap<Op, Duration>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
}

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";

pub fn activity(name: &str, max: i64, participants: &[&str]) -> Activity {
    Activity::new(
        name,
        ActivityDetails {
            description: format!("{} description", name),
            schedule: "Mon 3pm".to_string(),
            max_participants: max,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        },
    )
}

impl FakeApi {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self {
            activities: RefCell::new(activities),
            signed_in: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
            failures: RefCell::new(HashMap::new()),
            latency: Cell::new(Duration::ZERO),
            op_latency: RefCell::new(HashMap::new()),
            in_flight: Cell::new(0),
            max_in_flight: Cell::new(0),
        }
    }

    /// A server holding the single "Chess Club" activity
    pub fn chess_club() -> Self {
        Self::new(vec![activity("Chess Club", 10, &["a@x.com"])])
    }

    /// Start with an open server-side session
    pub fn signed_in(self) -> Self {
        *self.signed_in.borrow_mut() = Some(USERNAME.to_string());
        self
    }

    /// Make every call to `op` fail with `error`
    pub fn fail(&self, op: Op, error: ApiError) {
        self.failures.borrow_mut().insert(op, error);
    }

    pub fn heal(&self, op: Op) {
        self.failures.borrow_mut().remove(&op);
    }

    /// Delay every response by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency.set(latency);
    }

    /// Delay responses to `op` only, overriding the general latency
    pub fn set_op_latency(&self, op: Op, latency: Duration) {
        self.op_latency.borrow_mut().insert(op, latency);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.borrow().iter().filter(|c| c.op() == op).count()
    }

    pub fn participants(&self, name: &str) -> Vec<String> {
        self.activities
            .borrow()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.participants.clone())
            .unwrap_or_default()
    }

    /// Largest number of mutating calls observed in flight at once
    pub fn max_concurrent_mutations(&self) -> usize {
        self.max_in_flight.get()
    }

    async fn enter(&self, call: Call) -> ApiResult<()> {
        let op = call.op();
        self.calls.borrow_mut().push(call);

        let mutating = matches!(op, Op::Signup | Op::Unregister);
        if mutating {
            let now = self.in_flight.get() + 1;
            self.in_flight.set(now);
            self.max_in_flight.set(self.max_in_flight.get().max(now));
        }

        let latency = self
            .op_latency
            .borrow()
            .get(&op)
            .copied()
            .unwrap_or_else(|| self.latency.get());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if mutating {
            self.in_flight.set(self.in_flight.get() - 1);
        }

        match self.failures.borrow().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn require_session(&self) -> ApiResult<()> {
        if self.signed_in.borrow().is_some() {
            Ok(())
        } else {
            Err(rejected(401, "Authentication required"))
        }
    }
}

fn rejected(status: u16, detail: &str) -> ApiError {
    ApiError::Rejected {
        status,
        detail: Some(detail.to_string()),
    }
}

#[async_trait(?Send)]
impl SignupApi for FakeApi {
    async fn auth_status(&self) -> ApiResult<AuthStatus> {
        self.enter(Call::AuthStatus).await?;
        let username = self.signed_in.borrow().clone();
        Ok(AuthStatus {
            authenticated: username.is_some(),
            username,
        })
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginReply> {
        self.enter(Call::Login {
            username: credentials.username.clone(),
        })
        .await?;

        if credentials.username == USERNAME && credentials.password == PASSWORD {
            *self.signed_in.borrow_mut() = Some(credentials.username.clone());
            Ok(LoginReply {
                username: Some(credentials.username.clone()),
            })
        } else {
            Err(rejected(401, "Invalid credentials"))
        }
    }

    async fn logout(&self) -> ApiResult<()> {
        self.enter(Call::Logout).await?;
        *self.signed_in.borrow_mut() = None;
        Ok(())
    }

    async fn activities(&self) -> ApiResult<Roster> {
        // The server answers with the roster as it stood when the request arrived
        let snapshot = self.activities.borrow().clone();
        self.enter(Call::Activities).await?;
        Ok(Roster::from(snapshot))
    }

    async fn signup(&self, activity: &str, email: &str) -> ApiResult<ActionReply> {
        self.enter(Call::Signup {
            activity: activity.to_string(),
            email: email.to_string(),
        })
        .await?;
        self.require_session()?;

        let mut activities = self.activities.borrow_mut();
        let entry = activities
            .iter_mut()
            .find(|a| a.name == activity)
            .ok_or_else(|| rejected(404, "Activity not found"))?;

        if entry.participants.iter().any(|p| p == email) {
            return Err(rejected(400, "Student is already signed up"));
        }
        entry.participants.push(email.to_string());

        Ok(ActionReply {
            message: Some(format!("Signed up {} for {}", email, activity)),
        })
    }

    async fn unregister(&self, activity: &str, email: &str) -> ApiResult<ActionReply> {
        self.enter(Call::Unregister {
            activity: activity.to_string(),
            email: email.to_string(),
        })
        .await?;
        self.require_session()?;

        let mut activities = self.activities.borrow_mut();
        let entry = activities
            .iter_mut()
            .find(|a| a.name == activity)
            .ok_or_else(|| rejected(404, "Activity not found"))?;

        let before = entry.participants.len();
        entry.participants.retain(|p| p != email);
        if entry.participants.len() == before {
            return Err(rejected(400, "Student is not signed up for this activity"));
        }

        Ok(ActionReply {
            message: Some(format!("Unregistered {} from {}", email, activity)),
        })
    }
}
