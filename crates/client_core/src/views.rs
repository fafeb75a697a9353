//! Text renderings of the dashboard state. Pure functions of their inputs.

use std::fmt::Write as _;

use shared::{
    domain::{Attendee, AttendeeStatus, Event},
    lifecycle::AttendeeStats,
};

use crate::dashboard::DashboardState;

fn matches_search(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

pub fn filter_events<'a>(events: &'a [Event], search: &str) -> Vec<&'a Event> {
    let needle = search.trim().to_lowercase();
    events
        .iter()
        .filter(|event| matches_search(&event.name, &needle))
        .collect()
}

/// Matches against `"first last"` and the email address, case-insensitively.
pub fn filter_attendees<'a>(attendees: &'a [Attendee], search: &str) -> Vec<&'a Attendee> {
    let needle = search.trim().to_lowercase();
    attendees
        .iter()
        .filter(|a| {
            matches_search(&format!("{} {}", a.first_name, a.last_name), &needle)
                || matches_search(&a.email, &needle)
        })
        .collect()
}

fn stats_line(stats: &AttendeeStats) -> String {
    format!(
        "Total: {}  Registered: {}  Checked-in: {}  No-show: {}",
        stats.total, stats.registered, stats.checked_in, stats.no_show
    )
}

pub fn render_event_list(events: &[Event], search: &str) -> String {
    let visible = filter_events(events, search);
    if visible.is_empty() {
        return if events.is_empty() {
            "No events yet. Import a roster to create one.\n".to_string()
        } else {
            format!("No events match \"{}\".\n", search.trim())
        };
    }

    let mut out = String::new();
    for event in visible {
        let stats = AttendeeStats::from_attendees(&event.attendees);
        let _ = writeln!(
            out,
            "[{}] {} ({})",
            event.id,
            event.name,
            event.date.format("%Y-%m-%d")
        );
        let _ = writeln!(out, "    {}", stats_line(&stats));
    }
    out
}

fn status_marker(status: AttendeeStatus) -> &'static str {
    match status {
        AttendeeStatus::Registered => " ",
        AttendeeStatus::CheckedIn => "x",
        AttendeeStatus::NoShow => "-",
    }
}

/// Stats come from the confirmed roster. A `pending` draft for one of the
/// rows is shown in place of that row and flagged as saving.
pub fn render_check_in_table(event: &Event, pending: Option<&Attendee>, search: &str) -> String {
    let stats = AttendeeStats::from_attendees(&event.attendees);
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", event.name, event.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "{}", stats_line(&stats));
    let _ = writeln!(out);

    let rows = filter_attendees(&event.attendees, search);
    if rows.is_empty() {
        let _ = writeln!(out, "No attendees match \"{}\".", search.trim());
        return out;
    }

    let name_width = rows
        .iter()
        .map(|a| a.first_name.chars().count() + a.last_name.chars().count() + 1)
        .max()
        .unwrap_or(0)
        .max("Name".len());
    let email_width = rows
        .iter()
        .map(|a| a.email.chars().count())
        .max()
        .unwrap_or(0)
        .max("Email".len());

    let _ = writeln!(
        out,
        "    {:>5}  {:<name_width$}  {:<email_width$}  {:<10}  Check-in Time",
        "Id", "Name", "Email", "Status"
    );
    for attendee in rows {
        let (attendee, saving) = match pending {
            Some(draft) if draft.id == attendee.id => (draft, "  (saving)"),
            _ => (attendee, ""),
        };
        let check_in = attendee
            .check_in_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "[{}] {:>5}  {:<name_width$}  {:<email_width$}  {:<10}  {}{}",
            status_marker(attendee.status),
            attendee.id,
            format!("{} {}", attendee.first_name, attendee.last_name),
            attendee.email,
            attendee.status.as_str(),
            check_in,
            saving
        );
    }
    out
}

/// The dismissible error banner, if one is showing.
pub fn render_banner(state: &DashboardState) -> Option<String> {
    state.error.as_ref().map(|message| format!("! {message}"))
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
