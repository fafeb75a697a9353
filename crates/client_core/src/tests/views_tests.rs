use super::*;
use chrono::{TimeZone, Utc};
use shared::domain::{AttendeeId, EventId};

fn attendee(id: i64, first: &str, last: &str, email: &str, status: AttendeeStatus) -> Attendee {
    Attendee {
        id: AttendeeId(id),
        event_id: EventId(1),
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        status,
        check_in_time: (status == AttendeeStatus::CheckedIn).then(|| {
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
                .single()
                .expect("time")
        }),
    }
}

fn gala() -> Event {
    Event {
        id: EventId(1),
        name: "Spring Gala".into(),
        date: Utc
            .with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
            .single()
            .expect("time"),
        attendees: vec![
            attendee(1, "Ann", "Lee", "ann@x.com", AttendeeStatus::CheckedIn),
            attendee(2, "Bo", "Kim", "bo@y.org", AttendeeStatus::Registered),
            attendee(3, "Cy", "Annis", "cy@x.com", AttendeeStatus::NoShow),
        ],
    }
}

#[test]
fn attendee_search_matches_full_name_or_email() {
    let event = gala();

    let names: Vec<_> = filter_attendees(&event.attendees, "ANN")
        .into_iter()
        .map(|a| a.id.0)
        .collect();
    assert_eq!(names, vec![1, 3]);

    let full: Vec<_> = filter_attendees(&event.attendees, "ann lee")
        .into_iter()
        .map(|a| a.id.0)
        .collect();
    assert_eq!(full, vec![1]);

    let by_email: Vec<_> = filter_attendees(&event.attendees, "y.org")
        .into_iter()
        .map(|a| a.id.0)
        .collect();
    assert_eq!(by_email, vec![2]);

    assert_eq!(filter_attendees(&event.attendees, "  ").len(), 3);
}

#[test]
fn event_list_filters_by_name_and_shows_totals() {
    let mut other = gala();
    other.id = EventId(2);
    other.name = "Board Meeting".into();
    other.attendees.clear();
    let events = vec![gala(), other];

    let all = render_event_list(&events, "");
    assert!(all.contains("[1] Spring Gala (2024-05-01)"));
    assert!(all.contains("Total: 3  Registered: 1  Checked-in: 1  No-show: 1"));
    assert!(all.contains("[2] Board Meeting"));

    let filtered = render_event_list(&events, "board");
    assert!(!filtered.contains("Spring Gala"));
    assert!(filtered.contains("Total: 0"));

    assert_eq!(
        render_event_list(&events, "picnic"),
        "No events match \"picnic\".\n"
    );
    assert!(render_event_list(&[], "").starts_with("No events yet"));
}

#[test]
fn check_in_table_lists_rows_with_status_and_time() {
    let table = render_check_in_table(&gala(), None, "");
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines[0], "Spring Gala (2024-05-01)");
    assert_eq!(lines[1], "Total: 3  Registered: 1  Checked-in: 1  No-show: 1");
    assert!(lines[3].contains("Check-in Time"));
    assert!(lines[4].starts_with("[x]"));
    assert!(lines[4].contains("Ann Lee"));
    assert!(lines[4].ends_with("2024-05-01 09:30"));
    assert!(lines[5].starts_with("[ ]"));
    assert!(lines[5].contains("Registered"));
    assert!(lines[6].starts_with("[-]"));
    assert!(lines[6].contains("No-show"));
}

#[test]
fn check_in_table_reports_empty_search() {
    let table = render_check_in_table(&gala(), None, "zed");
    assert!(table.contains("Total: 3"));
    assert!(table.ends_with("No attendees match \"zed\".\n"));
}

#[test]
fn check_in_table_shows_pending_draft_without_touching_stats() {
    let event = gala();
    let draft = Attendee {
        status: AttendeeStatus::CheckedIn,
        check_in_time: Some(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0)
                .single()
                .expect("time"),
        ),
        ..event.attendees[1].clone()
    };

    let table = render_check_in_table(&event, Some(&draft), "");
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines[1], "Total: 3  Registered: 1  Checked-in: 1  No-show: 1");
    assert!(lines[5].starts_with("[x]"));
    assert!(lines[5].contains("Bo Kim"));
    assert!(lines[5].ends_with("2024-05-01 10:15  (saving)"));
    assert!(!lines[4].contains("(saving)"));
    assert!(!lines[6].contains("(saving)"));
}

#[test]
fn banner_only_when_error_present() {
    let mut state = DashboardState::default();
    assert_eq!(render_banner(&state), None);

    state.error = Some("Error deleting event: boom".into());
    assert_eq!(
        render_banner(&state).as_deref(),
        Some("! Error deleting event: boom")
    );
}
