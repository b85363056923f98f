//! Feedback Channel
//!
//! Time-limited notices. Each channel shows at most one notice; posting a new
//! one supersedes the current one, and every notice clears itself once its
//! expiry elapses unless something newer has replaced it.
//!
//! Expiry timers are spawned with [`tokio::task::spawn_local`], so channels
//! must be used from inside a [`tokio::task::LocalSet`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::view::{Document, Page};

/// Severity of a notice, which decides how it is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

/// A transient user-facing message
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub severity: Severity,
    pub expires_after: Duration,
}

impl Notice {
    pub fn new(text: impl Into<String>, severity: Severity, expires_after: Duration) -> Self {
        Self {
            text: text.into(),
            severity,
            expires_after,
        }
    }

    pub fn success(text: impl Into<String>, expires_after: Duration) -> Self {
        Self::new(text, Severity::Success, expires_after)
    }

    pub fn error(text: impl Into<String>, expires_after: Duration) -> Self {
        Self::new(text, Severity::Error, expires_after)
    }

    pub fn info(text: impl Into<String>, expires_after: Duration) -> Self {
        Self::new(text, Severity::Info, expires_after)
    }
}

/// Notice lifetimes and the post-login close delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeTimings {
    /// Login, logout and gate-block notices
    pub short: Duration,
    /// Signup and unregister outcome notices
    pub long: Duration,
    /// How long the login success notice stays up before the dialog closes
    pub login_close_delay: Duration,
}

impl Default for NoticeTimings {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(3),
            long: Duration::from_secs(5),
            login_close_delay: Duration::from_secs(1),
        }
    }
}

/// Which page region a channel writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Main,
    Login,
}

impl Channel {
    fn slot(self, page: &mut Page) -> &mut Option<Notice> {
        match self {
            Channel::Main => &mut page.message,
            Channel::Login => &mut page.login_modal.message,
        }
    }
}

/// A single notice slot on the page
pub struct FeedbackChannel {
    document: Document,
    channel: Channel,
    /// Bumped on every post and clear; stale expiry timers compare against it
    generation: Cell<u64>,
}

impl FeedbackChannel {
    pub fn new(document: Document, channel: Channel) -> Self {
        Self {
            document,
            channel,
            generation: Cell::new(0),
        }
    }

    /// Show `notice`, replacing whatever this channel currently shows
    pub fn post(self: &Rc<Self>, notice: Notice) {
        let generation = self.bump();
        let expires_after = notice.expires_after;

        tracing::debug!(
            channel = ?self.channel,
            severity = notice.severity.as_str(),
            text = %notice.text,
            "Posting notice"
        );

        let channel = self.channel;
        self.document
            .update(|page| *channel.slot(page) = Some(notice));

        let this = Rc::clone(self);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(expires_after).await;
            this.expire(generation);
        });
    }

    /// Remove the current notice, if any
    pub fn clear(&self) {
        self.bump();
        let channel = self.channel;
        self.document.update(|page| *channel.slot(page) = None);
    }

    pub fn current(&self) -> Option<Notice> {
        let channel = self.channel;
        self.document.read(|page| match channel {
            Channel::Main => page.message.clone(),
            Channel::Login => page.login_modal.message.clone(),
        })
    }

    fn expire(&self, generation: u64) {
        if self.generation.get() == generation {
            self.clear();
        }
    }

    fn bump(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }
}
