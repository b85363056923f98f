//! Modal Controller
//!
//! Visibility lifecycle of the login dialog.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::feedback::FeedbackChannel;
use crate::view::{Document, LoginForm};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    Open,
}

/// Where a pointer event landed while the dialog is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The dimmed area around the dialog
    Backdrop,
    /// Anywhere inside the dialog itself
    Content,
}

pub struct ModalController {
    document: Document,
    login_feedback: Rc<FeedbackChannel>,
    state: Cell<ModalState>,
    /// Counts openings so a delayed close never hits a later opening
    opened: Cell<u64>,
}

impl ModalController {
    pub fn new(document: Document, login_feedback: Rc<FeedbackChannel>) -> Self {
        Self {
            document,
            login_feedback,
            state: Cell::new(ModalState::Closed),
            opened: Cell::new(0),
        }
    }

    pub fn state(&self) -> ModalState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == ModalState::Open
    }

    pub fn open(&self) {
        if self.is_open() {
            return;
        }
        self.opened.set(self.opened.get() + 1);
        self.set(ModalState::Open);
    }

    /// Close the dialog. Always clears the login notice.
    pub fn close(&self) {
        self.set(ModalState::Closed);
        self.login_feedback.clear();
    }

    /// Route a pointer event; only the backdrop closes the dialog
    pub fn pointer(&self, target: PointerTarget) {
        if target == PointerTarget::Backdrop && self.is_open() {
            self.close();
        }
    }

    /// Close after a successful login, once `delay` has let the success
    /// notice be seen. The login form is reset as the dialog closes.
    pub fn close_after_login(self: &Rc<Self>, delay: Duration) {
        let opening = self.opened.get();
        let this = Rc::clone(self);

        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if this.opened.get() != opening || !this.is_open() {
                return;
            }
            this.close();
            this.document
                .update(|page| page.login_modal.form = LoginForm::default());
        });
    }

    fn set(&self, state: ModalState) {
        self.state.set(state);
        self.document
            .update(|page| page.login_modal.visible = state == ModalState::Open);
    }
}
