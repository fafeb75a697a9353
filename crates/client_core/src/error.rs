use roster::RosterError;
use shared::domain::{AttendeeId, EventId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Parse(#[from] RosterError),
    #[error("No valid attendees found in file")]
    NoAttendees,
    #[error("Only .xlsx files can be imported")]
    UnsupportedFile,
    #[error("{message}")]
    Network {
        status: Option<u16>,
        message: String,
    },
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
    #[error("event {0} is not loaded")]
    UnknownEvent(EventId),
    #[error("attendee {0} is not part of the current event")]
    UnknownAttendee(AttendeeId),
}

impl DashboardError {
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.status().map(|s| s.as_u16()), err.to_string())
    }
}
