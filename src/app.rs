//! App Root
//!
//! Wires the components around one shared [`Document`] and routes user events
//! to them. [`App::start`] is the bootstrap: it probes the session and loads
//! the roster concurrently.

use futures_util::future::join;
use std::rc::Rc;
use tokio::task::JoinHandle;

use crate::api::SignupApi;
use crate::dispatcher::{ActionDispatcher, ActionOutcome, ActivityQueue};
use crate::feedback::{Channel, FeedbackChannel, NoticeTimings};
use crate::modal::{ModalController, PointerTarget};
use crate::roster::RosterRenderer;
use crate::session::SessionGate;
use crate::view::{Document, LoginForm, Page, RemoveTarget};

/// Client behaviour knobs
#[derive(Debug, Clone, Copy)]
pub struct AppSettings {
    pub timings: NoticeTimings,
    /// Queue signup/unregister per activity instead of letting them race
    pub serialize_per_activity: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            timings: NoticeTimings::default(),
            serialize_per_activity: true,
        }
    }
}

/// Something the user did on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    OpenLogin,
    CloseLogin,
    Pointer(PointerTarget),
    SubmitLogin { username: String, password: String },
    Logout,
    SubmitSignup { email: String, activity: String },
    Remove(RemoveTarget),
    Refresh,
}

/// A running client
pub struct App {
    document: Document,
    gate: Rc<SessionGate>,
    roster: Rc<RosterRenderer>,
    modal: Rc<ModalController>,
    dispatcher: ActionDispatcher,
}

impl App {
    pub fn new(api: Rc<dyn SignupApi>, settings: AppSettings) -> Self {
        let document = Document::new();

        let gate = Rc::new(SessionGate::new(api.clone(), document.clone()));
        let roster = Rc::new(RosterRenderer::new(
            api.clone(),
            document.clone(),
            gate.clone(),
        ));
        let feedback = Rc::new(FeedbackChannel::new(document.clone(), Channel::Main));
        let login_feedback = Rc::new(FeedbackChannel::new(document.clone(), Channel::Login));
        let modal = Rc::new(ModalController::new(document.clone(), login_feedback.clone()));

        let dispatcher = ActionDispatcher::new(
            api,
            document.clone(),
            gate.clone(),
            roster.clone(),
            feedback,
            login_feedback,
            modal.clone(),
            settings.timings,
            ActivityQueue::new(settings.serialize_per_activity),
        );

        Self {
            document,
            gate,
            roster,
            modal,
            dispatcher,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn session_gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn snapshot(&self) -> Page {
        self.document.snapshot()
    }

    /// Initial load.
    ///
    /// Both requests start together. Gating is re-run once both settle so
    /// control enablement reflects the probed session whichever lands first.
    pub async fn start(&self) {
        tracing::debug!("Bootstrapping page");

        join(self.gate.probe(), self.roster.refresh()).await;
        self.gate.apply_gating();
    }

    /// Handle one event to completion
    pub async fn handle(&self, event: UiEvent) -> Option<ActionOutcome> {
        match event {
            UiEvent::OpenLogin => {
                self.modal.open();
                None
            }
            UiEvent::CloseLogin => {
                self.modal.close();
                None
            }
            UiEvent::Pointer(target) => {
                self.modal.pointer(target);
                None
            }
            UiEvent::SubmitLogin { username, password } => {
                self.document.update(|page| {
                    page.login_modal.form = LoginForm {
                        username: username.clone(),
                        password: password.clone(),
                    }
                });
                Some(self.dispatcher.login(&username, &password).await)
            }
            UiEvent::Logout => Some(self.dispatcher.logout().await),
            UiEvent::SubmitSignup { email, activity } => {
                self.document.update(|page| {
                    page.signup_form.email = email.clone();
                    page.signup_form.activity = Some(activity.clone());
                });
                Some(self.dispatcher.signup(&email, &activity).await)
            }
            UiEvent::Remove(target) => Some(
                self.dispatcher
                    .unregister(&target.email, &target.activity)
                    .await,
            ),
            UiEvent::Refresh => {
                self.roster.refresh().await;
                None
            }
        }
    }

    /// Handle an event in the background so the caller stays responsive.
    ///
    /// Events are not queued behind each other; overlapping actions run
    /// concurrently and the server decides the final state.
    pub fn dispatch(self: &Rc<Self>, event: UiEvent) -> JoinHandle<Option<ActionOutcome>> {
        let this = Rc::clone(self);
        tokio::task::spawn_local(async move { this.handle(event).await })
    }
}
