//! Attendee status lifecycle.
//!
//! Any status is reachable from any other. The only rule is the timestamp
//! invariant: `check_in_time` is set exactly when the status is
//! [`AttendeeStatus::CheckedIn`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Attendee, AttendeeStatus};

/// Returns a copy of `attendee` moved to `status`.
///
/// Moving into `CheckedIn` stamps `now`; staying in `CheckedIn` keeps the
/// original stamp. Every other status clears it.
pub fn apply_status(attendee: &Attendee, status: AttendeeStatus, now: DateTime<Utc>) -> Attendee {
    let check_in_time = match (status, attendee.status) {
        (AttendeeStatus::CheckedIn, AttendeeStatus::CheckedIn) => attendee.check_in_time.or(Some(now)),
        (AttendeeStatus::CheckedIn, _) => Some(now),
        _ => None,
    };

    Attendee {
        status,
        check_in_time,
        ..attendee.clone()
    }
}

pub fn satisfies_check_in_invariant(attendee: &Attendee) -> bool {
    attendee.check_in_time.is_some() == (attendee.status == AttendeeStatus::CheckedIn)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeStats {
    pub total: usize,
    pub registered: usize,
    pub checked_in: usize,
    pub no_show: usize,
}

impl AttendeeStats {
    pub fn from_attendees(attendees: &[Attendee]) -> Self {
        attendees.iter().fold(
            Self {
                total: attendees.len(),
                ..Self::default()
            },
            |mut stats, attendee| {
                match attendee.status {
                    AttendeeStatus::Registered => stats.registered += 1,
                    AttendeeStatus::CheckedIn => stats.checked_in += 1,
                    AttendeeStatus::NoShow => stats.no_show += 1,
                }
                stats
            },
        )
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
