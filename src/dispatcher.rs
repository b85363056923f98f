//! Action Dispatcher
//!
//! Runs the four user actions against the service and turns each outcome
//! into page effects and a notice:
//!
//! 1. signup/unregister are gate-checked first and never reach the network
//!    without a session
//! 2. success applies the action's effect (roster refresh, session change,
//!    dialog close) and posts a success or info notice
//! 3. a rejection posts the server's reason, or a fixed fallback
//! 4. a request that never completed posts a distinct fixed fallback
//!
//! Nothing on the page changes on a failed action apart from the notice.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api::{ApiError, SignupApi};
use crate::feedback::{FeedbackChannel, Notice, NoticeTimings};
use crate::modal::ModalController;
use crate::roster::RosterRenderer;
use crate::session::{AuthError, SessionGate};
use crate::view::Document;

pub const SIGNUP_BLOCKED: &str = "Please login to register students.";
pub const UNREGISTER_BLOCKED: &str = "Please login to unregister students.";
pub const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
pub const UNREGISTER_FAILED: &str = "Failed to unregister. Please try again.";
pub const LOGIN_FAILED: &str = "Failed to login. Please try again.";
pub const ACTION_REJECTED_FALLBACK: &str = "An error occurred";
pub const LOGIN_SUCCESS: &str = "Login successful!";
pub const LOGOUT_SUCCESS: &str = "Logged out successfully";

/// How an action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Stopped by the session gate before any request
    Blocked,
    /// The server confirmed the action
    Completed,
    /// The server refused the action
    Rejected,
    /// The request never completed
    Failed,
}

type Slots = Rc<RefCell<HashMap<String, Arc<Mutex<()>>>>>;

/// Single-flight queue for mutating requests, keyed by activity name.
///
/// While a signup or unregister for an activity is in flight, the next one
/// for the same activity waits for it. Different activities never wait on
/// each other. An activity's entry is dropped once nobody holds or waits on it.
#[derive(Default)]
pub struct ActivityQueue {
    enabled: bool,
    slots: Slots,
}

/// Exclusive turn on one activity; released on drop
pub struct ActivitySlot {
    activity: String,
    slots: Slots,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ActivitySlot {
    fn drop(&mut self) {
        self.guard.take();

        let mut slots = self.slots.borrow_mut();
        let idle = slots
            .get(&self.activity)
            .map_or(false, |slot| Arc::strong_count(slot) == 1);
        if idle {
            slots.remove(&self.activity);
        }
    }
}

impl ActivityQueue {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Wait for this activity's slot. Returns `None` when queueing is off.
    pub async fn acquire(&self, activity: &str) -> Option<ActivitySlot> {
        if !self.enabled {
            return None;
        }

        let slot = {
            let mut slots = self.slots.borrow_mut();
            Arc::clone(slots.entry(activity.to_string()).or_default())
        };
        let guard = slot.lock_owned().await;

        Some(ActivitySlot {
            activity: activity.to_string(),
            slots: Rc::clone(&self.slots),
            guard: Some(guard),
        })
    }

    /// Activities currently held or waited on
    pub fn tracked(&self) -> usize {
        self.slots.borrow().len()
    }
}

/// Everything the dispatcher needs to act on the page
pub struct ActionDispatcher {
    api: Rc<dyn SignupApi>,
    document: Document,
    gate: Rc<SessionGate>,
    roster: Rc<RosterRenderer>,
    feedback: Rc<FeedbackChannel>,
    login_feedback: Rc<FeedbackChannel>,
    modal: Rc<ModalController>,
    timings: NoticeTimings,
    queue: ActivityQueue,
}

#[derive(Clone, Copy)]
enum Mutation {
    Signup,
    Unregister,
}

impl Mutation {
    fn name(self) -> &'static str {
        match self {
            Mutation::Signup => "signup",
            Mutation::Unregister => "unregister",
        }
    }

    fn blocked(self) -> &'static str {
        match self {
            Mutation::Signup => SIGNUP_BLOCKED,
            Mutation::Unregister => UNREGISTER_BLOCKED,
        }
    }

    fn failed(self) -> &'static str {
        match self {
            Mutation::Signup => SIGNUP_FAILED,
            Mutation::Unregister => UNREGISTER_FAILED,
        }
    }

    fn confirmed(self, email: &str, activity: &str) -> String {
        match self {
            Mutation::Signup => format!("Signed up {} for {}", email, activity),
            Mutation::Unregister => format!("Unregistered {} from {}", email, activity),
        }
    }
}

impl ActionDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Rc<dyn SignupApi>,
        document: Document,
        gate: Rc<SessionGate>,
        roster: Rc<RosterRenderer>,
        feedback: Rc<FeedbackChannel>,
        login_feedback: Rc<FeedbackChannel>,
        modal: Rc<ModalController>,
        timings: NoticeTimings,
        queue: ActivityQueue,
    ) -> Self {
        Self {
            api,
            document,
            gate,
            roster,
            feedback,
            login_feedback,
            modal,
            timings,
            queue,
        }
    }

    /// Register `email` for `activity`
    pub async fn signup(&self, email: &str, activity: &str) -> ActionOutcome {
        self.mutate(Mutation::Signup, email, activity).await
    }

    /// Remove `email` from `activity`
    pub async fn unregister(&self, email: &str, activity: &str) -> ActionOutcome {
        self.mutate(Mutation::Unregister, email, activity).await
    }

    async fn mutate(&self, mutation: Mutation, email: &str, activity: &str) -> ActionOutcome {
        if !self.gate.is_authenticated() {
            return self.block(mutation);
        }

        let slot = self.queue.acquire(activity).await;
        // The session may have ended while this request waited its turn
        if !self.gate.is_authenticated() {
            drop(slot);
            return self.block(mutation);
        }

        let result = match mutation {
            Mutation::Signup => self.api.signup(activity, email).await,
            Mutation::Unregister => self.api.unregister(activity, email).await,
        };
        drop(slot);

        match result {
            Ok(reply) => {
                let text = reply
                    .message
                    .unwrap_or_else(|| mutation.confirmed(email, activity));
                self.feedback.post(Notice::success(text, self.timings.long));

                if let Mutation::Signup = mutation {
                    self.document.update(|page| page.signup_form.reset());
                }

                self.roster.refresh().await;
                ActionOutcome::Completed
            }
            Err(ApiError::Rejected { status, detail }) => {
                tracing::debug!(action = mutation.name(), status, "Rejected by server");
                let text = detail.unwrap_or_else(|| ACTION_REJECTED_FALLBACK.to_string());
                self.feedback.post(Notice::error(text, self.timings.long));
                ActionOutcome::Rejected
            }
            Err(e) => {
                tracing::warn!(action = mutation.name(), activity, error = %e, "Request failed");
                self.feedback
                    .post(Notice::error(mutation.failed(), self.timings.long));
                ActionOutcome::Failed
            }
        }
    }

    fn block(&self, mutation: Mutation) -> ActionOutcome {
        tracing::debug!(action = mutation.name(), "Blocked by session gate");
        self.feedback
            .post(Notice::error(mutation.blocked(), self.timings.short));
        ActionOutcome::Blocked
    }

    /// Submit credentials; on success the dialog closes after a short delay
    pub async fn login(&self, username: &str, password: &str) -> ActionOutcome {
        match self.gate.login(username, password).await {
            Ok(_) => {
                self.login_feedback
                    .post(Notice::success(LOGIN_SUCCESS, self.timings.short));
                self.modal.close_after_login(self.timings.login_close_delay);
                ActionOutcome::Completed
            }
            Err(AuthError::Rejected(reason)) => {
                self.login_feedback
                    .post(Notice::error(reason, self.timings.short));
                ActionOutcome::Rejected
            }
            Err(AuthError::Transport(e)) => {
                tracing::warn!(error = %e, "Login request failed");
                self.login_feedback
                    .post(Notice::error(LOGIN_FAILED, self.timings.short));
                ActionOutcome::Failed
            }
        }
    }

    /// End the session. Failures change nothing on the page.
    ///
    /// Without a session there is nothing to end and no request is sent.
    pub async fn logout(&self) -> ActionOutcome {
        if !self.gate.is_authenticated() {
            tracing::debug!("Logout ignored, no session");
            return ActionOutcome::Blocked;
        }

        match self.gate.logout().await {
            Ok(()) => {
                self.feedback
                    .post(Notice::info(LOGOUT_SUCCESS, self.timings.short));
                ActionOutcome::Completed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout failed, keeping session");
                if e.is_transport() {
                    ActionOutcome::Failed
                } else {
                    ActionOutcome::Rejected
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeApi, Op, PASSWORD, USERNAME};
    use crate::feedback::{Channel, Severity};
    use crate::modal::ModalController;
    use std::time::Duration;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    struct Harness {
        api: Rc<FakeApi>,
        doc: Document,
        gate: Rc<SessionGate>,
        modal: Rc<ModalController>,
        dispatcher: Rc<ActionDispatcher>,
    }

    fn harness(api: FakeApi, serialize: bool) -> Harness {
        let api = Rc::new(api);
        let doc = Document::new();
        let dyn_api: Rc<dyn SignupApi> = api.clone();
        let gate = Rc::new(SessionGate::new(dyn_api.clone(), doc.clone()));
        let roster = Rc::new(RosterRenderer::new(dyn_api.clone(), doc.clone(), gate.clone()));
        let feedback = Rc::new(FeedbackChannel::new(doc.clone(), Channel::Main));
        let login_feedback = Rc::new(FeedbackChannel::new(doc.clone(), Channel::Login));
        let modal = Rc::new(ModalController::new(doc.clone(), login_feedback.clone()));
        let dispatcher = Rc::new(ActionDispatcher::new(
            dyn_api,
            doc.clone(),
            gate.clone(),
            roster,
            feedback,
            login_feedback,
            modal.clone(),
            NoticeTimings::default(),
            ActivityQueue::new(serialize),
        ));

        Harness {
            api,
            doc,
            gate,
            modal,
            dispatcher,
        }
    }

    async fn signed_in(api: FakeApi) -> Harness {
        let h = harness(api.signed_in(), true);
        h.gate.probe().await;
        h
    }

    fn message(doc: &Document) -> Option<(String, Severity)> {
        doc.read(|p| p.message.as_ref().map(|n| (n.text.clone(), n.severity)))
    }

    fn login_message(doc: &Document) -> Option<String> {
        doc.read(|p| p.login_modal.message.as_ref().map(|n| n.text.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_blocked_without_session() {
        LocalSet::new()
            .run_until(async {
                let h = harness(FakeApi::chess_club(), true);

                let outcome = h.dispatcher.unregister("a@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Blocked);
                assert_eq!(
                    message(&h.doc),
                    Some((UNREGISTER_BLOCKED.to_string(), Severity::Error))
                );
                assert!(h.api.calls().is_empty());

                // Gate notices are short-lived
                sleep(Duration::from_millis(3100)).await;
                assert_eq!(message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_blocked_without_session() {
        LocalSet::new()
            .run_until(async {
                let h = harness(FakeApi::chess_club(), true);

                let outcome = h.dispatcher.signup("b@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Blocked);
                assert_eq!(
                    message(&h.doc),
                    Some((SIGNUP_BLOCKED.to_string(), Severity::Error))
                );
                assert_eq!(h.api.count(Op::Signup), 0);
                assert_eq!(h.api.calls().len(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_refreshes_once_with_server_list() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;
                h.doc.update(|p| {
                    p.signup_form.email = "b@x.com".into();
                    p.signup_form.activity = Some("Chess Club".into());
                });

                let outcome = h.dispatcher.signup("b@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Completed);
                assert_eq!(h.api.count(Op::Activities), 1);

                let page = h.doc.snapshot();
                let card = &page.activities.cards()[0];
                assert_eq!(card.spots_left, 8);
                let emails: Vec<&str> = card.participants.iter().map(|r| r.email.as_str()).collect();
                assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
                assert_eq!(
                    page.message.unwrap().text,
                    "Signed up b@x.com for Chess Club"
                );
                assert_eq!(page.signup_form.email, "");
                assert_eq!(page.signup_form.activity, None);

                // Outcome notices are long-lived
                sleep(Duration::from_millis(4900)).await;
                assert!(message(&h.doc).is_some());
                sleep(Duration::from_millis(200)).await;
                assert_eq!(message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_refreshes_once() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;

                let outcome = h.dispatcher.unregister("a@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Completed);
                assert_eq!(h.api.count(Op::Activities), 1);
                assert_eq!(
                    h.api.calls().last(),
                    Some(&Call::Activities)
                );

                let page = h.doc.snapshot();
                assert!(page.activities.cards()[0].participants.is_empty());
                assert_eq!(page.activities.cards()[0].spots_left, 10);
                assert_eq!(
                    page.message.unwrap().text,
                    "Unregistered a@x.com from Chess Club"
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_surfaces_detail_without_refresh() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;
                h.doc.update(|p| p.signup_form.email = "a@x.com".into());

                let outcome = h.dispatcher.signup("a@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Rejected);
                assert_eq!(
                    message(&h.doc),
                    Some(("Student is already signed up".to_string(), Severity::Error))
                );
                assert_eq!(h.api.count(Op::Activities), 0);
                // The form keeps its input so the user can correct it
                assert_eq!(h.doc.read(|p| p.signup_form.email.clone()), "a@x.com");
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_without_detail_uses_fallback() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;
                h.api.fail(
                    Op::Unregister,
                    ApiError::Rejected {
                        status: 500,
                        detail: None,
                    },
                );

                h.dispatcher.unregister("a@x.com", "Chess Club").await;
                assert_eq!(
                    message(&h.doc),
                    Some((ACTION_REJECTED_FALLBACK.to_string(), Severity::Error))
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_transport_failure() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;
                h.api.fail(Op::Signup, ApiError::Transport("connection reset".into()));

                let outcome = h.dispatcher.signup("b@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Failed);
                assert_eq!(
                    message(&h.doc),
                    Some((SIGNUP_FAILED.to_string(), Severity::Error))
                );
                assert_eq!(h.api.count(Op::Activities), 0);

                sleep(Duration::from_millis(5100)).await;
                assert_eq!(message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_timeout_is_transport_failure() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;
                h.api.fail(Op::Unregister, ApiError::Timeout);

                let outcome = h.dispatcher.unregister("a@x.com", "Chess Club").await;
                assert_eq!(outcome, ActionOutcome::Failed);
                assert_eq!(
                    message(&h.doc),
                    Some((UNREGISTER_FAILED.to_string(), Severity::Error))
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_enables_gated_controls() {
        LocalSet::new()
            .run_until(async {
                let h = harness(FakeApi::chess_club(), true);
                h.gate.probe().await;
                h.dispatcher.roster.refresh().await;
                assert!(h.doc.read(|p| p.gated_controls().iter().all(|c| !c.enabled)));

                h.modal.open();
                let outcome = h.dispatcher.login(USERNAME, PASSWORD).await;
                assert_eq!(outcome, ActionOutcome::Completed);
                assert!(h.gate.is_authenticated());
                assert!(h.doc.read(|p| p.gated_controls().iter().all(|c| c.enabled)));
                assert_eq!(login_message(&h.doc).as_deref(), Some(LOGIN_SUCCESS));
                // No extra roster fetch was needed
                assert_eq!(h.api.count(Op::Activities), 1);

                sleep(Duration::from_millis(1100)).await;
                assert!(!h.modal.is_open());
                assert_eq!(login_message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_credentials_keep_dialog_open() {
        LocalSet::new()
            .run_until(async {
                let h = harness(FakeApi::chess_club(), true);
                h.modal.open();

                let outcome = h.dispatcher.login(USERNAME, "wrong").await;
                assert_eq!(outcome, ActionOutcome::Rejected);
                assert_eq!(login_message(&h.doc).as_deref(), Some("Invalid credentials"));
                assert!(!h.gate.is_authenticated());

                sleep(Duration::from_millis(2000)).await;
                assert!(h.modal.is_open());

                sleep(Duration::from_millis(1100)).await;
                assert_eq!(login_message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_transport_failure() {
        LocalSet::new()
            .run_until(async {
                let h = harness(FakeApi::chess_club(), true);
                h.api.fail(Op::Login, ApiError::Transport("dns error".into()));
                h.modal.open();

                let outcome = h.dispatcher.login(USERNAME, PASSWORD).await;
                assert_eq!(outcome, ActionOutcome::Failed);
                assert_eq!(login_message(&h.doc).as_deref(), Some(LOGIN_FAILED));
                assert!(h.modal.is_open());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_success_and_silent_failure() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;

                h.api.fail(Op::Logout, ApiError::Transport("connection reset".into()));
                assert_eq!(h.dispatcher.logout().await, ActionOutcome::Failed);
                assert!(h.gate.is_authenticated());
                assert_eq!(message(&h.doc), None);

                h.api.heal(Op::Logout);
                assert_eq!(h.dispatcher.logout().await, ActionOutcome::Completed);
                assert!(!h.gate.is_authenticated());
                assert_eq!(
                    message(&h.doc),
                    Some((LOGOUT_SUCCESS.to_string(), Severity::Info))
                );

                sleep(Duration::from_millis(3100)).await;
                assert_eq!(message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_activity_mutations_are_serialized() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::new(vec![crate::api::fake::activity(
                    "Chess Club",
                    10,
                    &["a@x.com", "b@x.com"],
                )]))
                .await;
                h.api.set_latency(Duration::from_millis(100));

                let first = {
                    let d = h.dispatcher.clone();
                    tokio::task::spawn_local(async move { d.unregister("a@x.com", "Chess Club").await })
                };
                let second = {
                    let d = h.dispatcher.clone();
                    tokio::task::spawn_local(async move { d.unregister("b@x.com", "Chess Club").await })
                };

                assert_eq!(first.await.unwrap(), ActionOutcome::Completed);
                assert_eq!(second.await.unwrap(), ActionOutcome::Completed);
                assert_eq!(h.api.max_concurrent_mutations(), 1);
                assert!(h.api.participants("Chess Club").is_empty());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_unregister_dropped_after_logout() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::new(vec![crate::api::fake::activity(
                    "Chess Club",
                    10,
                    &["a@x.com", "b@x.com"],
                )]))
                .await;
                h.api.set_op_latency(Op::Unregister, Duration::from_millis(100));

                let first = {
                    let d = h.dispatcher.clone();
                    tokio::task::spawn_local(async move { d.unregister("a@x.com", "Chess Club").await })
                };
                let second = {
                    let d = h.dispatcher.clone();
                    tokio::task::spawn_local(async move { d.unregister("b@x.com", "Chess Club").await })
                };

                // Let the first request go out while the second waits its turn
                sleep(Duration::from_millis(10)).await;
                assert_eq!(h.api.count(Op::Unregister), 1);

                assert_eq!(h.dispatcher.logout().await, ActionOutcome::Completed);
                assert!(!h.gate.is_authenticated());

                // Sent while signed in; the server refuses it once the session is gone
                assert_eq!(first.await.unwrap(), ActionOutcome::Rejected);
                assert_eq!(second.await.unwrap(), ActionOutcome::Blocked);
                assert_eq!(h.api.count(Op::Unregister), 1);
                assert_eq!(
                    message(&h.doc),
                    Some((UNREGISTER_BLOCKED.to_string(), Severity::Error))
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_forgets_idle_activities() {
        LocalSet::new()
            .run_until(async {
                let h = signed_in(FakeApi::chess_club()).await;
                h.api.set_latency(Duration::from_millis(50));

                let tasks: Vec<_> = ["x@x.com", "y@x.com"]
                    .into_iter()
                    .map(|email| {
                        let d = h.dispatcher.clone();
                        tokio::task::spawn_local(async move { d.signup(email, "Chess Club").await })
                    })
                    .collect();

                sleep(Duration::from_millis(10)).await;
                assert_eq!(h.dispatcher.queue.tracked(), 1);

                for task in tasks {
                    task.await.unwrap();
                }
                h.dispatcher.signup("z@x.com", "No Such Club").await;
                assert_eq!(h.dispatcher.queue.tracked(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_without_session_sends_nothing() {
        LocalSet::new()
            .run_until(async {
                let h = harness(FakeApi::chess_club(), true);

                assert_eq!(h.dispatcher.logout().await, ActionOutcome::Blocked);
                assert_eq!(h.api.count(Op::Logout), 0);
                assert_eq!(message(&h.doc), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unserialized_mutations_overlap() {
        LocalSet::new()
            .run_until(async {
                let h = harness(
                    FakeApi::new(vec![crate::api::fake::activity(
                        "Chess Club",
                        10,
                        &["a@x.com", "b@x.com"],
                    )])
                    .signed_in(),
                    false,
                );
                h.gate.probe().await;
                h.api.set_latency(Duration::from_millis(100));

                let first = {
                    let d = h.dispatcher.clone();
                    tokio::task::spawn_local(async move { d.unregister("a@x.com", "Chess Club").await })
                };
                let second = {
                    let d = h.dispatcher.clone();
                    tokio::task::spawn_local(async move { d.unregister("b@x.com", "Chess Club").await })
                };
                first.await.unwrap();
                second.await.unwrap();

                assert_eq!(h.api.max_concurrent_mutations(), 2);
                // Both refreshes converge on the server's final roster
                assert!(h.doc.read(|p| p.activities.cards()[0].participants.is_empty()));
            })
            .await;
    }
}
