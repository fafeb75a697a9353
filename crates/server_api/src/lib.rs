use chrono::Utc;
use roster::ExportedRoster;
use shared::{
    domain::{Attendee, AttendeeId, AttendeeStatus, Event, EventId},
    error::ApiError,
    protocol::{CreateEventRequest, DeleteEventResponse},
};
use storage::Storage;
use tracing::error;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_events(ctx: &ApiContext) -> Result<Vec<Event>, ApiError> {
    ctx.storage
        .list_events()
        .await
        .map_err(|e| internal("Failed to fetch events", e))
}

pub async fn get_event(ctx: &ApiContext, event_id: EventId) -> Result<Event, ApiError> {
    ctx.storage
        .get_event(event_id)
        .await
        .map_err(|e| internal("Failed to fetch event", e))?
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

pub async fn create_event(ctx: &ApiContext, req: CreateEventRequest) -> Result<Event, ApiError> {
    ctx.storage
        .create_event(&req.name, req.date, &req.attendees)
        .await
        .map_err(|e| internal("Failed to create event", e))
}

pub async fn delete_event(
    ctx: &ApiContext,
    event_id: EventId,
) -> Result<DeleteEventResponse, ApiError> {
    let existed = ctx
        .storage
        .delete_event(event_id)
        .await
        .map_err(|e| internal("Failed to delete event", e))?;
    if !existed {
        return Err(ApiError::not_found("Event not found"));
    }
    Ok(DeleteEventResponse {
        success: true,
        message: "Event deleted successfully".to_string(),
        id: event_id,
    })
}

pub async fn update_attendee(
    ctx: &ApiContext,
    attendee_id: AttendeeId,
    status: AttendeeStatus,
) -> Result<Attendee, ApiError> {
    ctx.storage
        .update_attendee_status(attendee_id, status, Utc::now())
        .await
        .map_err(|e| internal("Failed to update attendee", e))?
        .ok_or_else(|| ApiError::not_found("Attendee not found"))
}

/// Builds the spreadsheet export of one event, named for today's date.
pub async fn export_event(ctx: &ApiContext, event_id: EventId) -> Result<ExportedRoster, ApiError> {
    let event = get_event(ctx, event_id).await?;
    roster::serialize(&event, Utc::now().date_naive()).map_err(|e| {
        error!(%event_id, error = %e, "roster export failed");
        ApiError::internal(e.to_string())
    })
}

fn internal(message: &str, err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "{message}");
    ApiError::internal(message)
}
