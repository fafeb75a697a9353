//! Dashboard controller: owns the view state and drives the event store.
//!
//! Every action awaits its store call before touching `events`, so local
//! state only ever reflects what the store confirmed. Failures are returned
//! to the caller and also kept as a dismissible banner message.

use chrono::{NaiveDate, Utc};
use roster::ExportedRoster;
use shared::{
    domain::{Attendee, AttendeeDraft, Event, EventId},
    lifecycle::apply_status,
    protocol::TransitionRequest,
};
use tracing::{debug, info, warn};

use crate::{error::DashboardError, store::EventStore};

/// Interactive yes/no prompt used before destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub events: Vec<Event>,
    pub current_event: Option<EventId>,
    pub loading: bool,
    pub error: Option<String>,
    /// Optimistic draft of a staged status change. Never written back into
    /// `events`; the store's answer replaces it.
    pub pending: Option<Attendee>,
}

impl DashboardState {
    pub fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn current_event(&self) -> Option<&Event> {
        self.current_event.and_then(|id| self.event(id))
    }

    fn merge_attendee(&mut self, updated: &Attendee) {
        let slot = self
            .events
            .iter_mut()
            .find(|e| e.id == updated.event_id)
            .and_then(|e| e.attendee_mut(updated.id));
        if let Some(slot) = slot {
            *slot = updated.clone();
        }
    }
}

pub struct Dashboard<S> {
    store: S,
    state: DashboardState,
}

impl<S: EventStore> Dashboard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: DashboardState::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    pub fn select_event(&mut self, event_id: EventId) -> Result<(), DashboardError> {
        if self.state.event(event_id).is_none() {
            return Err(DashboardError::UnknownEvent(event_id));
        }
        self.state.current_event = Some(event_id);
        Ok(())
    }

    pub fn back_to_list(&mut self) {
        self.state.current_event = None;
    }

    fn fail<T>(&mut self, prefix: &str, err: DashboardError) -> Result<T, DashboardError> {
        warn!(error = %err, "{prefix}");
        self.state.error = Some(format!("{prefix}: {err}"));
        Err(err)
    }

    pub async fn refresh(&mut self) -> Result<(), DashboardError> {
        self.state.loading = true;
        self.state.error = None;
        let result = self.store.list_events().await;
        self.state.loading = false;

        match result {
            Ok(events) => {
                debug!(events = events.len(), "loaded events");
                self.state.events = events;
                if let Some(current) = self.state.current_event {
                    if self.state.event(current).is_none() {
                        self.state.current_event = None;
                    }
                }
                Ok(())
            }
            Err(err) => self.fail("Failed to load events", err),
        }
    }

    /// Parses an uploaded roster and creates an event named after the file.
    /// The new event becomes the current one.
    pub async fn import_roster(
        &mut self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Event, DashboardError> {
        self.state.error = None;
        let drafts = match parse_upload(filename, bytes) {
            Ok(drafts) => drafts,
            Err(err) => return self.fail("Error uploading file", err),
        };
        let name = roster::event_name_from_filename(filename).to_string();

        self.state.loading = true;
        let result = self.store.create_event(&name, Utc::now(), drafts).await;
        self.state.loading = false;

        match result {
            Ok(event) => {
                info!(event_id = %event.id, attendees = event.attendees.len(), "imported roster");
                self.state.current_event = Some(event.id);
                self.state.events.push(event.clone());
                Ok(event)
            }
            Err(err) => self.fail("Error uploading file", err),
        }
    }

    pub fn export(
        &mut self,
        event_id: EventId,
        exported_on: NaiveDate,
    ) -> Result<ExportedRoster, DashboardError> {
        self.state.error = None;
        let result = match self.state.event(event_id) {
            Some(event) => roster::serialize(event, exported_on).map_err(DashboardError::from),
            None => Err(DashboardError::UnknownEvent(event_id)),
        };
        match result {
            Ok(exported) => {
                info!(%event_id, filename = %exported.filename, "exported roster");
                Ok(exported)
            }
            Err(err) => self.fail("Error exporting file", err),
        }
    }

    /// Stages a status change for an attendee of the current event and
    /// returns the optimistic draft, which stays in `pending` until
    /// [`Dashboard::complete_status`] reconciles it with the store.
    ///
    /// Requesting the status the attendee already has stages nothing and
    /// returns the attendee unchanged.
    pub fn begin_status(&mut self, request: TransitionRequest) -> Result<Attendee, DashboardError> {
        self.state.error = None;
        let Some(attendee) = self
            .state
            .current_event()
            .and_then(|e| e.attendee(request.attendee_id))
            .cloned()
        else {
            return self.fail(
                "Error updating event",
                DashboardError::UnknownAttendee(request.attendee_id),
            );
        };
        if attendee.status == request.status {
            self.state.pending = None;
            return Ok(attendee);
        }

        let draft = apply_status(&attendee, request.status, Utc::now());
        debug!(attendee_id = %draft.id, status = %draft.status, "staged status change");
        self.state.pending = Some(draft.clone());
        Ok(draft)
    }

    /// Sends the staged change to the store and merges the confirmed record.
    /// The draft is discarded either way. Returns `Ok(None)` when nothing
    /// was staged.
    pub async fn complete_status(&mut self) -> Result<Option<Attendee>, DashboardError> {
        let Some(draft) = self.state.pending.clone() else {
            return Ok(None);
        };

        self.state.loading = true;
        let result = self.store.update_attendee(draft.id, draft.status).await;
        self.state.loading = false;
        self.state.pending = None;

        match result {
            Ok(updated) => {
                info!(
                    attendee_id = %updated.id,
                    status = %updated.status,
                    "attendee status confirmed"
                );
                self.state.merge_attendee(&updated);
                Ok(Some(updated))
            }
            Err(err) => self.fail("Error updating event", err),
        }
    }

    /// Stages and completes one status change.
    pub async fn set_status(
        &mut self,
        request: TransitionRequest,
    ) -> Result<Attendee, DashboardError> {
        let draft = self.begin_status(request)?;
        Ok(self.complete_status().await?.unwrap_or(draft))
    }

    /// Deletes an event after confirmation. Returns `Ok(false)` when the
    /// confirmation was declined.
    pub async fn delete_event(
        &mut self,
        event_id: EventId,
        confirm: &dyn Confirm,
    ) -> Result<bool, DashboardError> {
        self.state.error = None;
        let Some(name) = self.state.event(event_id).map(|e| e.name.clone()) else {
            return self.fail("Error deleting event", DashboardError::UnknownEvent(event_id));
        };
        if !confirm.confirm(&format!(
            "Are you sure you want to delete the event \"{name}\"?"
        )) {
            debug!(%event_id, "delete declined");
            return Ok(false);
        }

        self.state.loading = true;
        let result = self.store.delete_event(event_id).await;
        self.state.loading = false;

        match result {
            Ok(response) => {
                info!(%event_id, message = %response.message, "deleted event");
                self.state.events.retain(|e| e.id != event_id);
                if self.state.current_event == Some(event_id) {
                    self.state.current_event = None;
                }
                Ok(true)
            }
            Err(err) => self.fail("Error deleting event", err),
        }
    }
}

fn parse_upload(filename: &str, bytes: &[u8]) -> Result<Vec<AttendeeDraft>, DashboardError> {
    if !roster::has_xlsx_extension(filename) {
        return Err(DashboardError::UnsupportedFile);
    }
    let rows = roster::parse(bytes)?;
    if rows.is_empty() {
        return Err(DashboardError::NoAttendees);
    }
    Ok(rows.into_iter().map(|row| row.into_draft()).collect())
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
