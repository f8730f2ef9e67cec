use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::api::models::Message;
use crate::error::{ClientError, Result};

/// Inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// `to` may be `current` for today.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let from = parse_day(from)?;
        let to = if to.trim().eq_ignore_ascii_case("current") {
            Utc::now().date_naive()
        } else {
            parse_day(to)?
        };
        if from > to {
            return Err(ClientError::validation("Start date is after end date."));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ClientError::validation(format!("Invalid date {:?}, expected YYYY-MM-DD.", s.trim())))
}

/// Accepts RFC 3339 and the offset-less ISO form the backend writes.
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

pub fn select_range<'a>(messages: &'a [Message], range: &DateRange) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| parse_timestamp(&m.timestamp).is_some_and(|ts| range.contains(ts.date())))
        .collect()
}

pub fn format_line(message: &Message) -> String {
    format!("[{}] {}: {}", message.timestamp, message.sender_name, message.text)
}

/// File name for a chat's transcript. Characters outside `[A-Za-z0-9_-]` in
/// the backend-supplied id become `_`.
pub fn default_file_name(chat_id: &str) -> String {
    let safe: String = chat_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("chat-{}.txt", safe)
}

/// Writes the selected messages to `path`, returning how many were written.
pub fn write_transcript(messages: &[Message], range: &DateRange, path: &Path) -> Result<usize> {
    let selected = select_range(messages, range);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    for message in &selected {
        writeln!(file, "{}", format_line(message))?;
    }
    Ok(selected.len())
}
