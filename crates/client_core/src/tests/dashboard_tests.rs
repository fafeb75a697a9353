use super::*;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_xlsxwriter::Workbook;
use shared::{
    domain::{AttendeeId, AttendeeStatus},
    lifecycle::AttendeeStats,
    protocol::DeleteEventResponse,
};
use std::sync::Mutex;

#[derive(Default)]
struct FakeInner {
    events: Vec<Event>,
    next_attendee_id: i64,
    fail_with: Option<String>,
    deletes: Vec<EventId>,
}

#[derive(Default)]
struct FakeStore {
    inner: Mutex<FakeInner>,
}

impl FakeStore {
    fn failing(message: &str) -> Self {
        let store = Self::default();
        store.inner.lock().expect("lock").fail_with = Some(message.to_string());
        store
    }

    fn check_failure(inner: &FakeInner) -> Result<(), DashboardError> {
        match &inner.fail_with {
            Some(message) => Err(DashboardError::network(Some(500), message.clone())),
            None => Ok(()),
        }
    }

    fn event_count(&self) -> usize {
        self.inner.lock().expect("lock").events.len()
    }

    fn deletes(&self) -> Vec<EventId> {
        self.inner.lock().expect("lock").deletes.clone()
    }
}

#[async_trait]
impl EventStore for FakeStore {
    async fn list_events(&self) -> Result<Vec<Event>, DashboardError> {
        let inner = self.inner.lock().expect("lock");
        Self::check_failure(&inner)?;
        Ok(inner.events.clone())
    }

    async fn create_event(
        &self,
        name: &str,
        date: DateTime<Utc>,
        attendees: Vec<AttendeeDraft>,
    ) -> Result<Event, DashboardError> {
        let mut inner = self.inner.lock().expect("lock");
        Self::check_failure(&inner)?;
        let event_id = EventId(inner.events.len() as i64 + 1);
        let mut created = Vec::with_capacity(attendees.len());
        for draft in attendees {
            inner.next_attendee_id += 1;
            created.push(Attendee {
                id: AttendeeId(inner.next_attendee_id),
                event_id,
                first_name: draft.first_name,
                last_name: draft.last_name,
                email: draft.email,
                status: AttendeeStatus::Registered,
                check_in_time: None,
            });
        }
        let event = Event {
            id: event_id,
            name: name.to_string(),
            date,
            attendees: created,
        };
        inner.events.push(event.clone());
        Ok(event)
    }

    async fn delete_event(&self, event_id: EventId) -> Result<DeleteEventResponse, DashboardError> {
        let mut inner = self.inner.lock().expect("lock");
        Self::check_failure(&inner)?;
        inner.deletes.push(event_id);
        inner.events.retain(|e| e.id != event_id);
        Ok(DeleteEventResponse {
            success: true,
            message: "Event deleted successfully".to_string(),
            id: event_id,
        })
    }

    async fn update_attendee(
        &self,
        attendee_id: AttendeeId,
        status: AttendeeStatus,
    ) -> Result<Attendee, DashboardError> {
        let mut inner = self.inner.lock().expect("lock");
        Self::check_failure(&inner)?;
        let attendee = inner
            .events
            .iter_mut()
            .find_map(|e| e.attendee_mut(attendee_id))
            .ok_or_else(|| DashboardError::network(Some(404), "Attendee not found"))?;
        *attendee = apply_status(attendee, status, Utc::now());
        Ok(attendee.clone())
    }
}

fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (row, cells) in rows.iter().enumerate() {
        for (col, value) in cells.iter().enumerate() {
            worksheet
                .write_string(row as u32, col as u16, *value)
                .expect("write cell");
        }
    }
    workbook.save_to_buffer().expect("save workbook")
}

fn ann_and_lee() -> Vec<u8> {
    workbook_bytes(&[
        &["First name", "Last name", "Email"],
        &["Ann", "Lee", "a@x.com"],
        &["Bo", "Kim", "b@x.com"],
    ])
}

async fn imported_dashboard() -> (Dashboard<FakeStore>, Event) {
    let mut dashboard = Dashboard::new(FakeStore::default());
    let event = dashboard
        .import_roster("Spring Gala.xlsx", &ann_and_lee())
        .await
        .expect("import");
    (dashboard, event)
}

fn never_confirm(_: &str) -> bool {
    false
}

#[tokio::test]
async fn import_creates_registered_event_and_selects_it() {
    let (dashboard, event) = imported_dashboard().await;

    assert_eq!(event.name, "Spring Gala");
    assert_eq!(event.attendees.len(), 2);
    assert!(event
        .attendees
        .iter()
        .all(|a| a.status == AttendeeStatus::Registered && a.check_in_time.is_none()));
    assert_eq!(event.attendees[0].first_name, "Ann");
    assert_eq!(event.attendees[1].email, "b@x.com");

    let state = dashboard.state();
    assert_eq!(state.events.len(), 1);
    assert_eq!(state.current_event, Some(event.id));
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn check_in_then_no_show_keeps_invariant() {
    let (mut dashboard, event) = imported_dashboard().await;
    let ann = event.attendees[0].id;

    let before = Utc::now();
    let checked_in = dashboard
        .set_status(TransitionRequest {
            attendee_id: ann,
            status: AttendeeStatus::CheckedIn,
        })
        .await
        .expect("check in");
    let stamp = checked_in.check_in_time.expect("stamped");
    assert!(stamp >= before);

    let current = dashboard.state().current_event().expect("current");
    assert_eq!(
        AttendeeStats::from_attendees(&current.attendees),
        AttendeeStats {
            total: 2,
            registered: 1,
            checked_in: 1,
            no_show: 0,
        }
    );
    assert!(dashboard.state().pending.is_none());

    let no_show = dashboard
        .set_status(TransitionRequest {
            attendee_id: ann,
            status: AttendeeStatus::NoShow,
        })
        .await
        .expect("no-show");
    assert_eq!(no_show.status, AttendeeStatus::NoShow);
    assert!(no_show.check_in_time.is_none());

    let stored = dashboard.state().current_event().expect("current").attendees[0].clone();
    assert_eq!(stored, no_show);
}

fn stored_status(store: &FakeStore, attendee_id: AttendeeId) -> Option<AttendeeStatus> {
    store
        .inner
        .lock()
        .expect("lock")
        .events
        .iter()
        .find_map(|e| e.attendee(attendee_id))
        .map(|a| a.status)
}

#[tokio::test]
async fn staged_draft_is_visible_until_the_store_confirms() {
    let (mut dashboard, event) = imported_dashboard().await;
    let ann = event.attendees[0].id;

    let draft = dashboard
        .begin_status(TransitionRequest {
            attendee_id: ann,
            status: AttendeeStatus::CheckedIn,
        })
        .expect("stage");
    assert_eq!(draft.status, AttendeeStatus::CheckedIn);
    assert!(draft.check_in_time.is_some());
    assert_eq!(dashboard.state().pending.as_ref(), Some(&draft));

    let current = dashboard.state().current_event().expect("current");
    assert_eq!(current.attendees[0].status, AttendeeStatus::Registered);
    assert_eq!(
        stored_status(dashboard.store(), ann),
        Some(AttendeeStatus::Registered)
    );
    let table = crate::views::render_check_in_table(current, dashboard.state().pending.as_ref(), "");
    assert!(table.contains("(saving)"));

    let confirmed = dashboard
        .complete_status()
        .await
        .expect("complete")
        .expect("staged change");
    assert_eq!(confirmed.status, AttendeeStatus::CheckedIn);
    assert!(dashboard.state().pending.is_none());
    assert_eq!(
        stored_status(dashboard.store(), ann),
        Some(AttendeeStatus::CheckedIn)
    );
    assert_eq!(
        dashboard.state().current_event().expect("current").attendees[0],
        confirmed
    );
    assert_eq!(dashboard.complete_status().await.expect("nothing staged"), None);
}

#[tokio::test]
async fn rejected_change_drops_draft_and_keeps_confirmed_state() {
    let (mut dashboard, event) = imported_dashboard().await;
    let ann = event.attendees[0].id;

    dashboard
        .begin_status(TransitionRequest {
            attendee_id: ann,
            status: AttendeeStatus::NoShow,
        })
        .expect("stage");
    dashboard.store().inner.lock().expect("lock").fail_with = Some("Failed to update attendee".into());

    let err = dashboard.complete_status().await.expect_err("store rejects");
    assert!(matches!(err, DashboardError::Network { .. }));
    assert!(dashboard.state().pending.is_none());
    assert_eq!(
        dashboard.state().current_event().expect("current").attendees[0].status,
        AttendeeStatus::Registered
    );
    assert_eq!(
        dashboard.state().error.as_deref(),
        Some("Error updating event: Failed to update attendee")
    );
}

#[tokio::test]
async fn repeating_current_status_does_not_touch_the_store() {
    let (mut dashboard, event) = imported_dashboard().await;
    let original = event.attendees[1].clone();
    dashboard.store().inner.lock().expect("lock").fail_with = Some("unreachable".into());

    let unchanged = dashboard
        .set_status(TransitionRequest {
            attendee_id: original.id,
            status: AttendeeStatus::Registered,
        })
        .await
        .expect("noop");
    assert_eq!(unchanged, original);
}

#[tokio::test]
async fn unknown_attendee_sets_banner() {
    let (mut dashboard, _) = imported_dashboard().await;

    let err = dashboard
        .set_status(TransitionRequest {
            attendee_id: AttendeeId(999),
            status: AttendeeStatus::CheckedIn,
        })
        .await
        .expect_err("unknown attendee");
    assert!(matches!(err, DashboardError::UnknownAttendee(AttendeeId(999))));
    assert!(dashboard
        .state()
        .error
        .as_deref()
        .is_some_and(|m| m.starts_with("Error updating event: ")));
}

#[tokio::test]
async fn header_only_sheet_is_an_upload_error_and_creates_nothing() {
    let mut dashboard = Dashboard::new(FakeStore::default());
    let bytes = workbook_bytes(&[&["First name", "Last name", "Email"]]);

    let err = dashboard
        .import_roster("empty.xlsx", &bytes)
        .await
        .expect_err("no attendees");
    assert!(matches!(err, DashboardError::NoAttendees));
    assert_eq!(
        dashboard.state().error.as_deref(),
        Some("Error uploading file: No valid attendees found in file")
    );
    assert_eq!(dashboard.store().event_count(), 0);
    assert!(dashboard.state().events.is_empty());
}

#[tokio::test]
async fn non_xlsx_upload_is_rejected() {
    let mut dashboard = Dashboard::new(FakeStore::default());

    let err = dashboard
        .import_roster("guests.csv", b"First name,Last name,Email\n")
        .await
        .expect_err("unsupported");
    assert!(matches!(err, DashboardError::UnsupportedFile));

    let err = dashboard
        .import_roster("broken.xlsx", b"not a zip archive")
        .await
        .expect_err("parse");
    assert!(matches!(err, DashboardError::Parse(_)));
    assert_eq!(dashboard.store().event_count(), 0);
}

#[tokio::test]
async fn declined_delete_is_silent() {
    let (mut dashboard, event) = imported_dashboard().await;

    let deleted = dashboard
        .delete_event(event.id, &never_confirm)
        .await
        .expect("declined");
    assert!(!deleted);
    assert!(dashboard.store().deletes().is_empty());
    assert_eq!(dashboard.state().events.len(), 1);
    assert_eq!(dashboard.state().current_event, Some(event.id));
    assert!(dashboard.state().error.is_none());
}

#[tokio::test]
async fn confirmed_delete_removes_event_and_clears_selection() {
    let (mut dashboard, event) = imported_dashboard().await;
    let prompts = Mutex::new(Vec::new());
    let confirm = |prompt: &str| {
        prompts.lock().expect("lock").push(prompt.to_string());
        true
    };

    let deleted = dashboard
        .delete_event(event.id, &confirm)
        .await
        .expect("delete");
    assert!(deleted);
    assert_eq!(
        *prompts.lock().expect("lock"),
        vec!["Are you sure you want to delete the event \"Spring Gala\"?".to_string()]
    );
    assert_eq!(dashboard.store().deletes(), vec![event.id]);
    assert!(dashboard.state().events.is_empty());
    assert!(dashboard.state().current_event.is_none());
}

#[tokio::test]
async fn store_failure_surfaces_as_banner() {
    let mut dashboard = Dashboard::new(FakeStore::failing("Failed to fetch events"));

    let err = dashboard.refresh().await.expect_err("refresh fails");
    assert!(matches!(err, DashboardError::Network { status: Some(500), .. }));
    assert_eq!(
        dashboard.state().error.as_deref(),
        Some("Failed to load events: Failed to fetch events")
    );
    assert!(!dashboard.state().loading);

    dashboard.dismiss_error();
    assert!(dashboard.state().error.is_none());
}

#[tokio::test]
async fn refresh_drops_selection_of_vanished_event() {
    let (mut dashboard, event) = imported_dashboard().await;
    dashboard
        .store()
        .inner
        .lock()
        .expect("lock")
        .events
        .clear();

    dashboard.refresh().await.expect("refresh");
    assert!(dashboard.state().events.is_empty());
    assert!(dashboard.state().current_event.is_none());
    assert!(matches!(
        dashboard.select_event(event.id),
        Err(DashboardError::UnknownEvent(_))
    ));
}

#[tokio::test]
async fn navigation_between_list_and_event() {
    let (mut dashboard, event) = imported_dashboard().await;

    dashboard.back_to_list();
    assert!(dashboard.state().current_event().is_none());

    dashboard.select_event(event.id).expect("select");
    assert_eq!(
        dashboard.state().current_event().map(|e| e.name.as_str()),
        Some("Spring Gala")
    );
}

#[tokio::test]
async fn export_uses_local_event_and_date() {
    let (mut dashboard, event) = imported_dashboard().await;
    let exported_on = Utc
        .with_ymd_and_hms(2024, 6, 2, 0, 0, 0)
        .single()
        .expect("time")
        .date_naive();

    let exported = dashboard.export(event.id, exported_on).expect("export");
    assert_eq!(exported.filename, "Spring Gala-2024-06-02.xlsx");

    let rows = roster::parse(&exported.bytes).expect("reparse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].first_name, "Ann");

    let err = dashboard
        .export(EventId(42), exported_on)
        .expect_err("unknown event");
    assert!(matches!(err, DashboardError::UnknownEvent(EventId(42))));
    assert_eq!(
        dashboard.state().error.as_deref(),
        Some("Error exporting file: event 42 is not loaded")
    );
}
