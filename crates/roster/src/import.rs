use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use shared::domain::AttendeeDraft;
use tracing::debug;

use crate::RosterError;

pub const FIRST_NAME_HEADER: &str = "First name";
pub const LAST_NAME_HEADER: &str = "Last name";
pub const EMAIL_HEADER: &str = "Email";

/// One parsed roster row. `row` is a 1-based position within this parse only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttendee {
    pub row: usize,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl RawAttendee {
    pub fn into_draft(self) -> AttendeeDraft {
        AttendeeDraft {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

#[derive(Default)]
struct ColumnMap {
    first_name: Option<usize>,
    last_name: Option<usize>,
    email: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[Data]) -> Self {
        let mut columns = Self::default();
        for (index, cell) in header.iter().enumerate() {
            let name = cell.to_string();
            let name = name.trim();
            let slot = if name.eq_ignore_ascii_case(FIRST_NAME_HEADER) {
                &mut columns.first_name
            } else if name.eq_ignore_ascii_case(LAST_NAME_HEADER) {
                &mut columns.last_name
            } else if name.eq_ignore_ascii_case(EMAIL_HEADER) {
                &mut columns.email
            } else {
                continue;
            };
            // first matching column wins
            slot.get_or_insert(index);
        }
        columns
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn cell_text(row: &[Data], column: Option<usize>) -> String {
    column
        .and_then(|index| row.get(index))
        .map(|cell| cell.to_string())
        .unwrap_or_default()
}

/// Parses the first sheet of an `.xlsx` workbook into attendee rows.
///
/// The first non-empty row is the header. An empty sheet yields no rows.
pub fn parse(bytes: &[u8]) -> Result<Vec<RawAttendee>, RosterError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Vec::new()),
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = ColumnMap::from_header(header);

    let attendees: Vec<RawAttendee> = rows
        .filter(|row| !row.iter().all(is_blank))
        .enumerate()
        .map(|(index, row)| RawAttendee {
            row: index + 1,
            first_name: cell_text(row, columns.first_name),
            last_name: cell_text(row, columns.last_name),
            email: cell_text(row, columns.email),
        })
        .collect();

    debug!(rows = attendees.len(), "parsed roster sheet");
    Ok(attendees)
}
