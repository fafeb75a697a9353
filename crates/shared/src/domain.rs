use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(EventId);
id_newtype!(AttendeeId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendeeStatus {
    #[default]
    Registered,
    #[serde(rename = "Checked-in")]
    CheckedIn,
    #[serde(rename = "No-show")]
    NoShow,
}

impl AttendeeStatus {
    pub const ALL: [AttendeeStatus; 3] = [
        AttendeeStatus::Registered,
        AttendeeStatus::CheckedIn,
        AttendeeStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendeeStatus::Registered => "Registered",
            AttendeeStatus::CheckedIn => "Checked-in",
            AttendeeStatus::NoShow => "No-show",
        }
    }
}

impl fmt::Display for AttendeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendee status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for AttendeeStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AttendeeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: AttendeeId,
    pub event_id: EventId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: AttendeeStatus,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

impl Event {
    pub fn attendee(&self, attendee_id: AttendeeId) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.id == attendee_id)
    }

    pub fn attendee_mut(&mut self, attendee_id: AttendeeId) -> Option<&mut Attendee> {
        self.attendees.iter_mut().find(|a| a.id == attendee_id)
    }
}

/// Name and contact fields of an attendee before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDraft {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl From<&Attendee> for AttendeeDraft {
    fn from(attendee: &Attendee) -> Self {
        Self {
            first_name: attendee.first_name.clone(),
            last_name: attendee.last_name.clone(),
            email: attendee.email.clone(),
        }
    }
}
