//! Roster Renderer
//!
//! Fetches the activity collection and rebuilds the activity list region and
//! the signup form's select options from it. Every refresh throws the old
//! render away, including every removal control, and builds a fresh one.

use chrono::Utc;
use std::cell::Cell;
use std::rc::Rc;

use crate::api::{Activity, SignupApi};
use crate::session::SessionGate;
use crate::view::{ActivityCard, ActivityList, Control, Document, ParticipantRow, REMOVE_LOCKED_TITLE};

/// Shown in place of the list when the fetch fails
pub const LOAD_FAILURE: &str = "Failed to load activities. Please try again later.";

/// Shown in place of an empty participant list
pub const NO_PARTICIPANTS: &str = "No participants yet";

pub struct RosterRenderer {
    api: Rc<dyn SignupApi>,
    document: Document,
    gate: Rc<SessionGate>,
    /// Ticket of the most recently issued fetch
    requested: Cell<u64>,
    /// Ticket of the fetch currently on the page
    rendered: Cell<u64>,
}

impl RosterRenderer {
    pub fn new(api: Rc<dyn SignupApi>, document: Document, gate: Rc<SessionGate>) -> Self {
        Self {
            api,
            document,
            gate,
            requested: Cell::new(0),
            rendered: Cell::new(0),
        }
    }

    /// Fetch and fully re-render the roster.
    ///
    /// Fetches are ticketed when issued. A response older than what is
    /// already on the page is dropped, so a slow early fetch never replaces
    /// a later one. Failures replace the list with [`LOAD_FAILURE`]; nothing
    /// is retried.
    pub async fn refresh(&self) {
        let ticket = self.requested.get() + 1;
        self.requested.set(ticket);

        let result = self.api.activities().await;

        if ticket < self.rendered.get() {
            tracing::debug!(ticket, rendered = self.rendered.get(), "Dropping stale roster");
            return;
        }
        self.rendered.set(ticket);

        match result {
            Ok(roster) => {
                let cards: Vec<ActivityCard> = roster.activities().iter().map(card_for).collect();
                let options: Vec<String> =
                    roster.activities().iter().map(|a| a.name.clone()).collect();

                tracing::debug!(generation = ticket, activities = cards.len(), "Rendering roster");

                self.document.update(|page| {
                    page.activities = ActivityList::Ready {
                        generation: ticket,
                        cards,
                    };
                    page.signup_form.set_options(options);
                    page.last_refreshed = Some(Utc::now());
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch activities");
                self.document
                    .update(|page| page.activities = ActivityList::Failed(LOAD_FAILURE.to_string()));
            }
        }

        self.gate.apply_gating();
    }
}

/// Build a card with one removal control per participant.
///
/// Controls start locked; the gating pass that follows every render decides
/// their final state.
fn card_for(activity: &Activity) -> ActivityCard {
    ActivityCard {
        name: activity.name.clone(),
        description: activity.description.clone(),
        schedule: activity.schedule.clone(),
        spots_left: activity.spots_left(),
        participants: activity
            .participants
            .iter()
            .map(|email| ParticipantRow {
                email: email.clone(),
                activity: activity.name.clone(),
                remove: Control::disabled(REMOVE_LOCKED_TITLE),
            })
            .collect(),
    }
}
