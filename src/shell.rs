//! Interactive shell commands
//!
//! Parses one line of user input and resolves it against the page the user
//! is looking at. Row numbers refer to the removal controls of the latest
//! render, numbered from 1.

use std::str::FromStr;
use thiserror::Error;

use crate::app::UiEvent;
use crate::modal::PointerTarget;
use crate::view::{Header, Page};

pub const HELP: &str = "\
Commands:
  login <username> <password>   Open the login dialog and submit it
  close                         Close the login dialog
  backdrop                      Click outside the login dialog
  logout                        End the teacher session
  signup <email> <activity>     Register a student for an activity
  remove <n>                    Unregister the participant in row n
  refresh                       Reload the activity list
  show                          Render the page again
  help                          Show this help
  quit                          Leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Close,
    Backdrop,
    Logout,
    Signup { email: String, activity: String },
    Remove(usize),
    Refresh,
    Show,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a row number: {0}")]
    BadRow(String),

    #[error("No participant in row {0}")]
    NoSuchRow(usize),

    #[error("Not signed in")]
    NotSignedIn,
}

/// What the shell should do with a resolved command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run these events in order, in the background
    Events(Vec<UiEvent>),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ShellError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Show);
        };
        let rest: Vec<&str> = words.collect();

        match head.to_ascii_lowercase().as_str() {
            "login" => match rest.as_slice() {
                [username, password] => Ok(Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(ShellError::Usage("login <username> <password>")),
            },
            "close" => Ok(Command::Close),
            "backdrop" => Ok(Command::Backdrop),
            "logout" => Ok(Command::Logout),
            "signup" => match rest.split_first() {
                Some((email, activity)) if !activity.is_empty() => Ok(Command::Signup {
                    email: email.to_string(),
                    activity: activity.join(" "),
                }),
                _ => Err(ShellError::Usage("signup <email> <activity>")),
            },
            "remove" => match rest.as_slice() {
                [n] => n
                    .parse()
                    .map(Command::Remove)
                    .map_err(|_| ShellError::BadRow(n.to_string())),
                _ => Err(ShellError::Usage("remove <n>")),
            },
            "refresh" => Ok(Command::Refresh),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(ShellError::Unknown(other.to_string())),
        }
    }
}

impl Command {
    /// Turn the command into page events, looking up row numbers on `page`
    pub fn resolve(self, page: &Page) -> Result<Step, ShellError> {
        let events = match self {
            Command::Login { username, password } => vec![
                UiEvent::OpenLogin,
                UiEvent::SubmitLogin { username, password },
            ],
            Command::Close => vec![UiEvent::CloseLogin],
            Command::Backdrop => vec![UiEvent::Pointer(PointerTarget::Backdrop)],
            Command::Logout => match page.header {
                Header::UserInfo { .. } => vec![UiEvent::Logout],
                Header::LoginButton => return Err(ShellError::NotSignedIn),
            },
            Command::Signup { email, activity } => vec![UiEvent::SubmitSignup { email, activity }],
            Command::Remove(row) => {
                let target = row
                    .checked_sub(1)
                    .and_then(|i| page.removal_targets().into_iter().nth(i))
                    .ok_or(ShellError::NoSuchRow(row))?;
                vec![UiEvent::Remove(target)]
            }
            Command::Refresh => vec![UiEvent::Refresh],
            Command::Show => return Ok(Step::Show),
            Command::Help => return Ok(Step::Help),
            Command::Quit => return Ok(Step::Quit),
        };
        Ok(Step::Events(events))
    }
}
