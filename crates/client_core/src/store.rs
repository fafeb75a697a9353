//! The event store as seen from the dashboard, and its HTTP implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use shared::{
    domain::{Attendee, AttendeeDraft, AttendeeId, AttendeeStatus, Event, EventId},
    error::ApiError,
    protocol::{
        attendee_route, event_route, events_route, CreateEventRequest, DeleteEventResponse,
        UpdateAttendeeRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::DashboardError;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, DashboardError>;
    /// Creates the event and its whole roster in one call.
    async fn create_event(
        &self,
        name: &str,
        date: DateTime<Utc>,
        attendees: Vec<AttendeeDraft>,
    ) -> Result<Event, DashboardError>;
    async fn delete_event(&self, event_id: EventId) -> Result<DeleteEventResponse, DashboardError>;
    async fn update_attendee(
        &self,
        attendee_id: AttendeeId,
        status: AttendeeStatus,
    ) -> Result<Attendee, DashboardError>;
}

pub struct HttpEventStore {
    http: Client,
    base_url: Url,
}

impl HttpEventStore {
    pub fn new(server_url: &str) -> Result<Self, DashboardError> {
        let mut base_url = Url::parse(server_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, DashboardError> {
        Ok(self.base_url.join(route.trim_start_matches('/'))?)
    }
}

/// Passes 2xx responses through; otherwise surfaces the server's `error`
/// message, or `fallback` when the body has none.
async fn ensure_success(response: Response, fallback: &str) -> Result<Response, DashboardError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiError>().await {
        Ok(body) if !body.message.trim().is_empty() => body.message,
        _ => fallback.to_string(),
    };
    warn!(status = status.as_u16(), %message, "event store request failed");
    Err(DashboardError::network(Some(status.as_u16()), message))
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn list_events(&self) -> Result<Vec<Event>, DashboardError> {
        let response = self.http.get(self.endpoint(events_route())?).send().await?;
        let events: Vec<Event> = ensure_success(response, "Failed to fetch events")
            .await?
            .json()
            .await?;
        debug!(events = events.len(), "fetched events");
        Ok(events)
    }

    async fn create_event(
        &self,
        name: &str,
        date: DateTime<Utc>,
        attendees: Vec<AttendeeDraft>,
    ) -> Result<Event, DashboardError> {
        let response = self
            .http
            .post(self.endpoint(events_route())?)
            .json(&CreateEventRequest {
                name: name.to_string(),
                date,
                attendees,
            })
            .send()
            .await?;
        Ok(ensure_success(response, "Failed to create event")
            .await?
            .json()
            .await?)
    }

    async fn delete_event(&self, event_id: EventId) -> Result<DeleteEventResponse, DashboardError> {
        let response = self
            .http
            .delete(self.endpoint(&event_route(event_id))?)
            .send()
            .await?;
        Ok(ensure_success(response, "Failed to delete event")
            .await?
            .json()
            .await?)
    }

    async fn update_attendee(
        &self,
        attendee_id: AttendeeId,
        status: AttendeeStatus,
    ) -> Result<Attendee, DashboardError> {
        let response = self
            .http
            .patch(self.endpoint(&attendee_route(attendee_id))?)
            .json(&UpdateAttendeeRequest { status })
            .send()
            .await?;
        Ok(ensure_success(response, "Failed to update attendee")
            .await?
            .json()
            .await?)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
