use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::feed::FeedDocument;

/// `twitter-feed-YYYY-MM-DD.xml`
pub fn feed_filename(date: NaiveDate) -> String {
    format!("twitter-feed-{}.xml", date.format("%Y-%m-%d"))
}

/// Render the feed and write it into `data_dir`, replacing any file from earlier today.
///
/// The document is rendered fully before anything touches the disk, then
/// written to a temporary sibling and renamed, so readers never see a partial feed.
pub fn save_feed(feed: &FeedDocument, data_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let xml = feed.to_xml().context("Failed to serialize feed")?;

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let filepath = data_dir.join(feed_filename(date));
    let temp_path = data_dir.join(format!(".{}.tmp", feed_filename(date)));

    if let Err(e) = fs::write(&temp_path, xml) {
        fs::remove_file(&temp_path).ok();
        return Err(e).with_context(|| format!("Failed to write {}", temp_path.display()));
    }

    if let Err(e) = fs::rename(&temp_path, &filepath) {
        fs::remove_file(&temp_path).ok();
        return Err(e)
            .with_context(|| format!("Failed to move feed into place: {}", filepath.display()));
    }

    Ok(filepath)
}
