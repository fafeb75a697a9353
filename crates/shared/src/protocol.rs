use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AttendeeDraft, AttendeeId, AttendeeStatus, EventId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<AttendeeDraft>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateAttendeeRequest {
    pub status: AttendeeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEventResponse {
    pub success: bool,
    pub message: String,
    pub id: EventId,
}

/// A single status change requested from the check-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub attendee_id: AttendeeId,
    pub status: AttendeeStatus,
}

pub fn events_route() -> &'static str {
    "/events"
}

pub fn event_route(event_id: EventId) -> String {
    format!("/events/{}", event_id.0)
}

pub fn event_export_route(event_id: EventId) -> String {
    format!("/events/{}/export", event_id.0)
}

pub fn attendee_route(attendee_id: AttendeeId) -> String {
    format!("/attendees/{}", attendee_id.0)
}
