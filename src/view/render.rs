//! Plain-text rendering of the page for the terminal front end.
//!
//! Removal controls are numbered across the whole list in display order, the
//! same order as [`Page::removal_targets`].

use std::fmt::{self, Display, Formatter};

use super::{ActivityList, Control, Header, Page};
use crate::feedback::{Notice, Severity};
use crate::roster::NO_PARTICIPANTS;

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "✓",
        Severity::Error => "✕",
        Severity::Info => "ℹ",
    }
}

fn write_notice(f: &mut Formatter<'_>, indent: &str, notice: &Notice) -> fmt::Result {
    writeln!(f, "{}{} {}", indent, marker(notice.severity), notice.text)
}

fn write_control(f: &mut Formatter<'_>, label: &str, control: &Control) -> fmt::Result {
    if control.enabled {
        write!(f, "[{}]", label)
    } else if control.title.is_empty() {
        write!(f, "[{} (disabled)]", label)
    } else {
        write!(f, "[{} (disabled: {})]", label, control.title)
    }
}

impl Display for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.header {
            Header::LoginButton => writeln!(f, "Activities                                 [Login]")?,
            Header::UserInfo { username } => {
                writeln!(f, "Activities                 Signed in as {} [Logout]", username)?
            }
        }

        if let Some(notice) = &self.message {
            write_notice(f, "", notice)?;
        }
        writeln!(f)?;

        match &self.activities {
            ActivityList::Loading => writeln!(f, "Loading activities...")?,
            ActivityList::Failed(message) => writeln!(f, "{}", message)?,
            ActivityList::Ready { cards, .. } => {
                if cards.is_empty() {
                    writeln!(f, "No activities available")?;
                }

                let mut row_number = 0;
                for card in cards {
                    writeln!(f, "{}", card.name)?;
                    writeln!(f, "  {}", card.description)?;
                    writeln!(f, "  Schedule: {}", card.schedule)?;
                    writeln!(f, "  Availability: {} spots left", card.spots_left)?;

                    if card.participants.is_empty() {
                        writeln!(f, "  {}", NO_PARTICIPANTS)?;
                    } else {
                        writeln!(f, "  Participants:")?;
                        for row in &card.participants {
                            row_number += 1;
                            write!(f, "    {:>2}. {} ", row_number, row.email)?;
                            write_control(f, "remove", &row.remove)?;
                            writeln!(f)?;
                        }
                    }
                    writeln!(f)?;
                }
            }
        }

        let form = &self.signup_form;
        writeln!(f, "Sign up a student")?;
        writeln!(
            f,
            "  Email: {}",
            if form.email.is_empty() { "-" } else { form.email.as_str() }
        )?;
        writeln!(
            f,
            "  Activity: {}",
            form.activity.as_deref().unwrap_or("-- Select an activity --")
        )?;
        if !form.options.is_empty() {
            writeln!(f, "  Options: {}", form.options.join(", "))?;
        }
        write!(f, "  ")?;
        write_control(f, "Sign Up", &form.submit)?;
        writeln!(f)?;

        if self.login_modal.visible {
            let modal = &self.login_modal;
            writeln!(f)?;
            writeln!(f, "+-- Teacher Login ---------------------------")?;
            writeln!(f, "| Username: {}", modal.form.username)?;
            writeln!(f, "| Password: {}", "*".repeat(modal.form.password.chars().count()))?;
            if let Some(notice) = &modal.message {
                write_notice(f, "| ", notice)?;
            }
            writeln!(f, "+--------------------------------------------")?;
        }

        if let Some(at) = self.last_refreshed {
            writeln!(f)?;
            writeln!(f, "Last refreshed: {}", at.format("%H:%M:%S"))?;
        }

        Ok(())
    }
}
