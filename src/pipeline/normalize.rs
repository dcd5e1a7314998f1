use crate::types::{Post, RawRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

/// Decodes the two entities the export double-escapes in `Tags`.
///
/// Only `&lt;` and `&gt;` are handled; every other entity is left untouched.
pub fn decode_tags(tags: &str) -> String {
    tags.replace("&lt;", "<").replace("&gt;", ">")
}

/// Parses a counter field. Absent or blank text is 0; text that is not a
/// number is also 0 and reported as `Err` so the caller can log it.
pub fn parse_count(value: Option<&str>) -> Result<i64, String> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(0);
    };
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n.trunc() as i64),
        _ => Err(raw.to_string()),
    }
}

/// Parses an export timestamp. Accepts RFC 3339 and the naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` form, which is taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Maps one raw row onto the persisted post shape.
///
/// Never fails: malformed counters become 0 and malformed timestamps become
/// null, each with a warning naming the post and field.
pub fn normalize_record(record: &RawRecord) -> Post {
    let id = record.get("Id").cloned().unwrap_or_default();
    let text = |key: &str| record.get(key).cloned().unwrap_or_default();
    let optional = |key: &str| record.get(key).cloned();

    let count = |key: &str| match parse_count(record.get(key).map(String::as_str)) {
        Ok(n) => n,
        Err(raw) => {
            warn!("Post {}: {} '{}' is not a number, using 0", id, key, raw);
            0
        }
    };

    let timestamp = |key: &str| {
        let raw = record.get(key)?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!("Post {}: {} '{}' is not a valid date, storing null", id, key, raw);
        }
        parsed
    };

    Post {
        id: id.clone(),
        post_type_id: optional("channel").or_else(|| optional("PostTypeId")),
        accepted_answer_id: optional("AcceptedAnswerId"),
        creation_date: timestamp("CreationDate"),
        score: count("Score"),
        view_count: count("ViewCount"),
        body: text("Body"),
        owner_user_id: optional("OwnerUserId"),
        last_activity_date: timestamp("LastActivityDate"),
        title: text("Title"),
        tags: record.get("Tags").map(|t| decode_tags(t)).unwrap_or_default(),
        answer_count: count("AnswerCount"),
        comment_count: count("CommentCount"),
        content_license: text("ContentLicense"),
    }
}

pub fn normalize_records(records: &[RawRecord]) -> Vec<Post> {
    let posts: Vec<Post> = records.iter().map(normalize_record).collect();
    debug!("Normalized {} records", posts.len());
    posts
}
