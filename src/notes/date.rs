use crate::notes::config::FileConfig;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, ParseResult};
use std::path::Path;

/// Parse a note file name such as `2024-04-05.txt` into its date.
///
/// The extension is stripped before parsing; the remaining basename must
/// match `format` exactly.
pub fn parse_file_name(file_name: &str, format: &str) -> ParseResult<NaiveDate> {
    let path = Path::new(file_name);
    let stem = match path.extension() {
        Some(_) => path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name),
        None => file_name,
    };
    NaiveDate::parse_from_str(stem, format)
}

pub fn is_note_file_name(file_name: &str, file: &FileConfig) -> bool {
    let ext = Path::new(file_name).extension().and_then(|e| e.to_str());
    ext == Some(file.ext.as_str()) && parse_file_name(file_name, &file.time_format).is_ok()
}

/// A note is old enough to archive once strictly more than
/// `after_days * 24` hours separate its midnight from `reference`.
pub fn is_archivable(file_date: NaiveDate, reference: NaiveDateTime, after_days: u32) -> bool {
    let age = reference.signed_duration_since(file_date.and_time(NaiveTime::MIN));
    age > Duration::hours(i64::from(after_days) * 24)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn month_key(date: NaiveDate, month_format: &str) -> String {
    date.format(month_format).to_string()
}
