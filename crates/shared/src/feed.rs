//! RSS 2.0 synthesis for the collected posts.
//!
//! The document is built in memory and rendered in one pass; nothing is
//! streamed to disk. Item identifiers come from [`item_guid`], a pure hash of
//! the account, the post text and its position in that account's list, so
//! unchanged content keeps its identity across runs.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::models::{AccountPosts, PostRecord};

pub const FEED_TITLE: &str = "Twitter Daily Report";
pub const FEED_LINK: &str = "https://x.com";
pub const TITLE_MAX_CHARS: usize = 100;

const RFC_822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub author: String,
    pub guid: String,
    pub link: Option<String>,
    pub pub_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub link: String,
    pub last_build_date: String,
    pub items: Vec<FeedItem>,
}

/// Stable identifier for a post: lowercase hex MD5 of `"{account}_{text}_{index}"`.
///
/// `index` is the post's position within its account's retained list.
pub fn item_guid(account: &str, text: &str, index: usize) -> String {
    format!("{:x}", md5::compute(format!("{}_{}_{}", account, text, index)))
}

/// First [`TITLE_MAX_CHARS`] characters, with `...` appended when cut.
pub fn truncate_title(text: &str) -> String {
    match text.char_indices().nth(TITLE_MAX_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// RFC 822 style date for `pubDate`, keeping the original offset.
pub fn format_pub_date(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.format(RFC_822_FORMAT).to_string())
}

impl FeedItem {
    pub fn from_post(account: &str, index: usize, post: &PostRecord) -> Self {
        Self {
            title: format!("@{}: {}", account, truncate_title(&post.text)),
            description: post.text.clone(),
            author: format!("@{}", account),
            guid: item_guid(account, &post.text, index),
            link: post.permalink.clone(),
            pub_date: post.timestamp.as_deref().and_then(format_pub_date),
        }
    }
}

impl FeedDocument {
    /// Build the feed from per-account batches, keeping their order.
    pub fn build(batches: &[AccountPosts], built_at: DateTime<FixedOffset>) -> Self {
        let items = batches
            .iter()
            .flat_map(|batch| {
                batch
                    .posts
                    .iter()
                    .enumerate()
                    .map(move |(index, post)| FeedItem::from_post(&batch.account, index, post))
            })
            .collect();

        Self {
            title: FEED_TITLE.to_string(),
            description: format!("Twitter daily report - {}", built_at.format("%Y-%m-%d")),
            link: FEED_LINK.to_string(),
            last_build_date: built_at.format(RFC_822_FORMAT).to_string(),
            items,
        }
    }

    /// Render the whole document as UTF-8 RSS 2.0.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        write_text_element(&mut writer, "title", &self.title)?;
        write_text_element(&mut writer, "description", &self.description)?;
        write_text_element(&mut writer, "link", &self.link)?;
        write_text_element(&mut writer, "lastBuildDate", &self.last_build_date)?;

        for item in &self.items {
            write_item(&mut writer, item)?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        let mut out = writer.into_inner();
        out.push(b'\n');
        String::from_utf8(out).context("Rendered feed is not valid UTF-8")
    }
}

fn write_item<W: Write>(writer: &mut Writer<W>, item: &FeedItem) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "description", &item.description)?;
    if let Some(link) = &item.link {
        write_text_element(writer, "link", link)?;
    }
    if let Some(pub_date) = &item.pub_date {
        write_text_element(writer, "pubDate", pub_date)?;
    }

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(Event::Start(guid))?;
    writer.write_event(Event::Text(BytesText::new(&item.guid)))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    write_text_element(writer, "author", &item.author)?;

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    let text = strip_invalid_xml_chars(text);
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// XML 1.0 allows tab, LF and CR but no other C0 controls.
fn strip_invalid_xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= '\u{20}')
        .filter(|&c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect()
}
