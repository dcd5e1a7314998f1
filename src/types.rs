use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One `row` element of the export: attribute/child name to text value.
pub type RawRecord = HashMap<String, String>;

/// A forum post in the shape persisted to the `posts` collection.
///
/// Counters and text fields are never null; identifiers and timestamps the
/// export may omit are `Option`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub post_type_id: Option<String>,
    pub accepted_answer_id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub score: i64,
    pub view_count: i64,
    pub body: String,
    pub owner_user_id: Option<String>,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub title: String,
    pub tags: String,
    pub answer_count: i64,
    pub comment_count: i64,
    pub content_license: String,
}

/// Result of the mean ViewCount query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCountStats {
    pub total_posts: usize,
    pub mean_view_count: f64,
    pub above_mean: usize,
}
