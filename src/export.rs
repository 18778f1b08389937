//! Export adapter — CSV and XLSX downloads of filtered record lists.
//!
//! DESIGN
//! ======
//! A `columns` slice of `(header, extractor)` pairs drives both encoders, so
//! every list shares one export path. CSV escaping is the only hand-rolled
//! piece: RFC 4180 quoting (quote fields containing comma, quote, or
//! newline; double internal quotes). The XLSX side delegates entirely to
//! `rust_xlsxwriter`.

use std::borrow::Cow;

use rust_xlsxwriter::{Workbook, XlsxError};
use time::OffsetDateTime;
use time::macros::format_description;

/// One export column: header text plus a field extractor.
pub struct Column<T> {
    pub header: &'static str,
    pub extract: fn(&T) -> String,
}

// =============================================================================
// CSV
// =============================================================================

/// Quote a field per RFC 4180 when it contains a comma, quote, or newline.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Encode records as CSV text with a header row. Rows are joined with CRLF.
#[must_use]
pub fn to_csv<T>(records: &[T], columns: &[Column<T>]) -> String {
    let mut out = String::new();
    let header = columns
        .iter()
        .map(|c| escape_field(c.header).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&header);
    out.push_str("\r\n");

    for record in records {
        let row = columns
            .iter()
            .map(|c| escape_field(&(c.extract)(record)).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push_str("\r\n");
    }
    out
}

// =============================================================================
// XLSX
// =============================================================================

/// Encode records as an XLSX workbook with one sheet.
///
/// # Errors
///
/// Returns an error if the workbook cannot be assembled or serialized.
pub fn to_xlsx<T>(records: &[T], columns: &[Column<T>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, column) in columns.iter().enumerate() {
        sheet.write_string(0, u16::try_from(col).unwrap_or(u16::MAX), column.header)?;
    }
    for (row, record) in records.iter().enumerate() {
        let row_num = u32::try_from(row + 1).unwrap_or(u32::MAX);
        for (col, column) in columns.iter().enumerate() {
            sheet.write_string(row_num, u16::try_from(col).unwrap_or(u16::MAX), (column.extract)(record))?;
        }
    }

    workbook.save_to_buffer()
}

// =============================================================================
// FILENAMES
// =============================================================================

/// Download filename: `laporan_<report>_<range>_<yyyy-mm-dd>.<ext>`.
#[must_use]
pub fn export_filename(report: &str, range: &str, ext: &str) -> String {
    let format = format_description!("[year]-[month]-[day]");
    let date = OffsetDateTime::now_utc()
        .date()
        .format(&format)
        .unwrap_or_else(|_| "unknown-date".into());
    format!("laporan_{report}_{range}_{date}.{ext}")
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
