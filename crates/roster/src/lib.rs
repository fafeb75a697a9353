//! Spreadsheet codec for attendee rosters.
//!
//! Imports read the first sheet of an `.xlsx` workbook; exports write a
//! single "Attendees" sheet with the current status of every attendee.

use thiserror::Error;

mod export;
mod import;

pub use export::{export_filename, serialize, ExportedRoster, EXPORT_HEADERS};
pub use import::{parse, RawAttendee, EMAIL_HEADER, FIRST_NAME_HEADER, LAST_NAME_HEADER};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLSX_EXTENSION: &str = ".xlsx";

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Error parsing Excel file: {0}")]
    Parse(#[from] calamine::XlsxError),
    #[error("Error generating Excel file: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
    #[error("Error generating Excel file: roster has more rows than a sheet can hold")]
    TooManyRows,
}

/// Derives an event name from an uploaded file name by dropping a trailing
/// `.xlsx` in any case.
pub fn event_name_from_filename(filename: &str) -> &str {
    let filename = filename.trim();
    if has_xlsx_extension(filename) {
        &filename[..filename.len() - XLSX_EXTENSION.len()]
    } else {
        filename
    }
}

pub fn has_xlsx_extension(filename: &str) -> bool {
    filename
        .trim()
        .to_ascii_lowercase()
        .ends_with(XLSX_EXTENSION)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
