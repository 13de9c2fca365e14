//! Raw archive record -> canonical [`Message`].

use crate::error::NormalizeError;
use chrono::{DateTime, Utc};
use regex::Regex;
use replypack_types::{truncate_to_second, Message, RawRecord};
use serde_json::Value;

const LOG_TIME_FORMAT: &str = "%Y-%m-%dT%H%M%S%z";

pub struct Normalizer {
    reply_marker: Regex,
    space_run: Regex,
    digit: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            reply_marker: Regex::new(r"@(\d+)").expect("reply marker pattern"),
            space_run: Regex::new(r" +").expect("space run pattern"),
            digit: Regex::new(r"^\d$").expect("digit pattern"),
        }
    }

    pub fn normalize(&self, record: &RawRecord) -> Result<Message, NormalizeError> {
        let id = parse_record_id(&record.id)?;
        let timestamp = parse_log_time(&record.time)?;
        let parent_ids = self.reply_targets(&record.text)?;
        let text = self.clean_text(&record.text);

        Ok(Message {
            id,
            text,
            author_id: record.user_id.clone(),
            timestamp,
            parent_ids,
        })
    }

    /// Every `@<digits>` marker in order of appearance, duplicates included.
    ///
    /// Any Unicode decimal digit counts, so `@١٢` and `@１２` both point at 12.
    pub fn reply_targets(&self, raw: &str) -> Result<Vec<i64>, NormalizeError> {
        self.reply_marker
            .captures_iter(raw)
            .map(|caps| self.marker_value(&caps[1]))
            .collect()
    }

    fn marker_value(&self, digits: &str) -> Result<i64, NormalizeError> {
        let overflow = || NormalizeError::InvalidParentId(digits.to_string());
        digits.chars().try_fold(0i64, |acc, c| {
            acc.checked_mul(10)
                .and_then(|acc| acc.checked_add(i64::from(self.digit_value(c))))
                .ok_or_else(overflow)
        })
    }

    /// Decimal digits are encoded as contiguous runs of ten starting at zero,
    /// so a digit's value is its offset from the start of its run, modulo 10.
    fn digit_value(&self, c: char) -> u32 {
        if let Some(d) = c.to_digit(10) {
            return d;
        }
        let mut start = c as u32;
        while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
            if !self.is_digit(prev) {
                break;
            }
            start -= 1;
        }
        (c as u32 - start) % 10
    }

    fn is_digit(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.digit.is_match(c.encode_utf8(&mut buf))
    }

    /// Strip markers, squeeze spaces, trim, then flatten newlines.
    pub fn clean_text(&self, raw: &str) -> String {
        let without_markers = self.reply_marker.replace_all(raw, "");
        let squeezed = self.space_run.replace_all(&without_markers, " ");
        squeezed.trim().replace('\n', " ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_record_id(value: &Value) -> Result<i64, NormalizeError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| NormalizeError::InvalidId(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| NormalizeError::InvalidId(format!("{s:?}"))),
        other => Err(NormalizeError::InvalidId(other.to_string())),
    }
}

/// Parse an archive timestamp such as `2016-04-01T12:30:00+03:00`.
///
/// Colons are stripped first, so `+0300` and `+03:00` offsets are both read.
/// The result is UTC at second resolution.
pub fn parse_log_time(raw: &str) -> Result<DateTime<Utc>, NormalizeError> {
    let mut compact: String = raw.trim().chars().filter(|c| *c != ':').collect();
    if compact.ends_with('Z') {
        compact.pop();
        compact.push_str("+0000");
    }
    let parsed = DateTime::parse_from_str(&compact, LOG_TIME_FORMAT).map_err(|source| {
        NormalizeError::InvalidTimestamp {
            raw: raw.to_string(),
            source,
        }
    })?;
    Ok(truncate_to_second(parsed.with_timezone(&Utc)))
}
