//! Page Document
//!
//! The headless document every component renders into. One [`Page`] is shared
//! by all components of a running client; each component owns its regions and
//! only writes those.
//!
//! The document lives on a single-threaded executor, so it is shared through
//! `Rc<RefCell<_>>` and never locked. Borrows are scoped to [`Document::update`]
//! and [`Document::read`] closures and are never held across an `.await`.

mod render;

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::Notify;

use crate::feedback::Notice;

/// Tooltip on the signup submit button while signed out
pub const SIGNUP_LOCKED_TITLE: &str = "Login required to register students";
/// Tooltip on removal controls while signed out
pub const REMOVE_LOCKED_TITLE: &str = "Login required to unregister students";
/// Tooltip on removal controls while signed in
pub const REMOVE_TITLE: &str = "Remove student";

/// An actionable control and its enablement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub enabled: bool,
    pub title: String,
}

impl Control {
    pub fn enabled(title: impl Into<String>) -> Self {
        Self {
            enabled: true,
            title: title.into(),
        }
    }

    pub fn disabled(title: impl Into<String>) -> Self {
        Self {
            enabled: false,
            title: title.into(),
        }
    }
}

/// Header region: login trigger or signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    LoginButton,
    UserInfo { username: String },
}

/// What a removal control acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveTarget {
    pub activity: String,
    pub email: String,
}

/// One participant line with its removal control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub email: String,
    pub activity: String,
    pub remove: Control,
}

impl ParticipantRow {
    pub fn target(&self) -> RemoveTarget {
        RemoveTarget {
            activity: self.activity.clone(),
            email: self.email.clone(),
        }
    }
}

/// A rendered activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    pub participants: Vec<ParticipantRow>,
}

/// The activity list region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityList {
    /// Nothing fetched yet
    Loading,
    /// A full render; `generation` increases with every rebuild
    Ready {
        generation: u64,
        cards: Vec<ActivityCard>,
    },
    /// The last fetch failed
    Failed(String),
}

impl ActivityList {
    pub fn cards(&self) -> &[ActivityCard] {
        match self {
            ActivityList::Ready { cards, .. } => cards,
            _ => &[],
        }
    }

    pub fn generation(&self) -> Option<u64> {
        match self {
            ActivityList::Ready { generation, .. } => Some(*generation),
            _ => None,
        }
    }

    /// Every participant row, in display order
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut ParticipantRow> {
        let cards: &mut [ActivityCard] = match self {
            ActivityList::Ready { cards, .. } => cards.as_mut_slice(),
            _ => &mut [],
        };
        cards.iter_mut().flat_map(|c| c.participants.iter_mut())
    }
}

/// The signup form region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub activity: Option<String>,
    /// Activity select options, one per activity in roster order
    pub options: Vec<String>,
    pub submit: Control,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            activity: None,
            options: Vec::new(),
            submit: Control::disabled(SIGNUP_LOCKED_TITLE),
        }
    }
}

impl SignupForm {
    /// Replace the select options, keeping the selection if it still exists
    pub fn set_options(&mut self, options: Vec<String>) {
        if let Some(selected) = &self.activity {
            if !options.contains(selected) {
                self.activity = None;
            }
        }
        self.options = options;
    }

    /// Clear the inputs; options and submit state are untouched
    pub fn reset(&mut self) {
        self.email.clear();
        self.activity = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// The login dialog region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginModal {
    pub visible: bool,
    pub form: LoginForm,
    /// Login-specific feedback channel
    pub message: Option<Notice>,
}

/// The whole page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub header: Header,
    /// Main feedback channel
    pub message: Option<Notice>,
    pub activities: ActivityList,
    pub signup_form: SignupForm,
    pub login_modal: LoginModal,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            header: Header::LoginButton,
            message: None,
            activities: ActivityList::Loading,
            signup_form: SignupForm::default(),
            login_modal: LoginModal::default(),
            last_refreshed: None,
        }
    }
}

impl Page {
    /// Targets of every removal control in display order.
    ///
    /// Row numbers shown by the renderer index into this list (1-based).
    pub fn removal_targets(&self) -> Vec<RemoveTarget> {
        self.activities
            .cards()
            .iter()
            .flat_map(|c| c.participants.iter().map(ParticipantRow::target))
            .collect()
    }

    /// Every gated control on the page
    pub fn gated_controls(&self) -> Vec<&Control> {
        std::iter::once(&self.signup_form.submit)
            .chain(
                self.activities
                    .cards()
                    .iter()
                    .flat_map(|c| c.participants.iter().map(|r| &r.remove)),
            )
            .collect()
    }
}

/// Shared handle to the page
#[derive(Clone, Default)]
pub struct Document {
    page: Rc<RefCell<Page>>,
    changed: Rc<Notify>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the page and signal observers
    pub fn update<R>(&self, f: impl FnOnce(&mut Page) -> R) -> R {
        let result = f(&mut self.page.borrow_mut());
        self.changed.notify_one();
        result
    }

    pub fn read<R>(&self, f: impl FnOnce(&Page) -> R) -> R {
        f(&self.page.borrow())
    }

    pub fn snapshot(&self) -> Page {
        self.page.borrow().clone()
    }

    /// Resolves after the next update (or immediately if one is pending)
    pub async fn changed(&self) {
        self.changed.notified().await;
    }
}
