use chrono::{DateTime, Duration, Utc};

use crate::models::PostRecord;

/// Posts older than this are dropped. A window reaching past chrono's range keeps everything.
pub fn cutoff(days_back: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days_back)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Keep posts at or after `now - days_back`.
///
/// A missing or unparsable timestamp keeps the post: the page doesn't always
/// expose times, and a post with no known age isn't evidence of staleness.
pub fn filter_recent(posts: Vec<PostRecord>, days_back: u32, now: DateTime<Utc>) -> Vec<PostRecord> {
    let cutoff = cutoff(days_back, now);
    posts
        .into_iter()
        .filter(|post| is_recent(post, cutoff))
        .collect()
}

fn is_recent(post: &PostRecord, cutoff: DateTime<Utc>) -> bool {
    match post.timestamp.as_deref().map(DateTime::parse_from_rfc3339) {
        Some(Ok(posted)) => posted >= cutoff,
        Some(Err(_)) | None => true,
    }
}
