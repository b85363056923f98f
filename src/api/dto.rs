//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the signup service.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================
// Session DTOs
// ============================================

/// Response of `GET /auth/status`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of `POST /login`
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Success body of `POST /login`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub username: Option<String>,
}

/// Success body of signup and unregister
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned with any non-success status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorDetail {
    /// Extract `detail` from a raw error body.
    ///
    /// Bodies that are not JSON, or whose detail is not a string, yield `None`.
    pub fn from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorDetail>(body)
            .ok()
            .and_then(|e| e.detail)
    }
}

// ============================================
// Roster DTOs
// ============================================

/// Per-activity payload of `GET /activities`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActivityDetails {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schedule: String,
    pub max_participants: i64,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// An activity with its current participants
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    pub participants: Vec<String>,
}

impl Activity {
    pub fn new(name: impl Into<String>, details: ActivityDetails) -> Self {
        Self {
            name: name.into(),
            description: details.description,
            schedule: details.schedule,
            max_participants: details.max_participants,
            participants: details.participants,
        }
    }

    /// Remaining capacity. Never clamped: an over-full activity goes negative.
    pub fn spots_left(&self) -> i64 {
        self.max_participants - self.participants.len() as i64
    }
}

/// The full activity collection, in server response order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    activities: Vec<Activity>,
}

impl Roster {
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl From<Vec<Activity>> for Roster {
    fn from(activities: Vec<Activity>) -> Self {
        Self { activities }
    }
}

// The wire format is a JSON object keyed by activity name. Visiting the map
// directly keeps the entries in document order.
impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RosterVisitor;

        impl<'de> Visitor<'de> for RosterVisitor {
            type Value = Roster;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of activity name to activity details")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Roster, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut activities = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, details)) = map.next_entry::<String, ActivityDetails>()? {
                    activities.push(Activity::new(name, details));
                }
                Ok(Roster { activities })
            }
        }

        deserializer.deserialize_map(RosterVisitor)
    }
}
