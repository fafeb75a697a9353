use chrono::{NaiveDate, SecondsFormat};
use rust_xlsxwriter::{Format, Workbook};
use shared::domain::{Attendee, Event};
use tracing::debug;

use crate::RosterError;

pub const EXPORT_HEADERS: [&str; 5] = ["First Name", "Last Name", "Email", "Status", "Check-in Time"];
const SHEET_NAME: &str = "Attendees";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedRoster {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `{event name}-{YYYY-MM-DD}.xlsx` for the day the export was taken.
///
/// The name is reduced to a single path component: separators, control
/// characters and `..` become `_`, and leading dots are dropped.
pub fn export_filename(event: &Event, exported_on: NaiveDate) -> String {
    format!(
        "{}-{}.xlsx",
        file_stem(&event.name),
        exported_on.format("%Y-%m-%d")
    )
}

fn file_stem(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = replaced.replace("..", "_");
    let stem = stem.trim().trim_start_matches('.');
    if stem.is_empty() {
        "event".to_string()
    } else {
        stem.to_string()
    }
}

fn export_row(attendee: &Attendee) -> [String; 5] {
    [
        attendee.first_name.clone(),
        attendee.last_name.clone(),
        attendee.email.clone(),
        attendee.status.to_string(),
        attendee
            .check_in_time
            .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
    ]
}

pub fn serialize(event: &Event, exported_on: NaiveDate) -> Result<ExportedRoster, RosterError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in (0u16..).zip(EXPORT_HEADERS) {
        worksheet.write_string_with_format(0, col, header, &header_format)?;
    }

    for (index, attendee) in event.attendees.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| RosterError::TooManyRows)?;
        for (col, value) in (0u16..).zip(export_row(attendee)) {
            worksheet.write_string(row, col, value.as_str())?;
        }
    }
    worksheet.autofit();

    let bytes = workbook.save_to_buffer()?;
    debug!(
        event_id = %event.id,
        rows = event.attendees.len(),
        size_bytes = bytes.len(),
        "serialized roster export"
    );

    Ok(ExportedRoster {
        filename: export_filename(event, exported_on),
        bytes,
    })
}
