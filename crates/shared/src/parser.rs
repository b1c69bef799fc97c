use chrono::DateTime;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use tracing::debug;
use url::Url;

use crate::models::PostRecord;

/// At most this many located nodes are parsed per account
pub const MAX_POSTS_PER_ACCOUNT: usize = 20;

const TEXT_SELECTOR: &str = r#"[data-testid="tweetText"]"#;
const TIME_SELECTOR: &str = "time";
const STATUS_LINK_SELECTOR: &str = r#"a[href*="/status/"]"#;

/// Turns located post containers into records.
#[derive(Debug, Clone)]
pub struct PostParser {
    origin: Option<Url>,
    text: Selector,
    time: Selector,
    status_link: Selector,
}

impl PostParser {
    pub fn new(origin: &str) -> Self {
        let origin = Url::parse(origin).ok();
        if origin.is_none() {
            debug!("site origin is not a valid URL; relative permalinks will be dropped");
        }

        Self {
            origin,
            text: fixed_selector(TEXT_SELECTOR),
            time: fixed_selector(TIME_SELECTOR),
            status_link: fixed_selector(STATUS_LINK_SELECTOR),
        }
    }

    /// Parse up to [`MAX_POSTS_PER_ACCOUNT`] nodes. Nodes without text are skipped.
    pub fn parse(&self, handle: &str, nodes: &[ElementRef<'_>]) -> Vec<PostRecord> {
        nodes
            .iter()
            .take(MAX_POSTS_PER_ACCOUNT)
            .enumerate()
            .filter_map(|(index, node)| {
                let record = self.parse_node(handle, *node);
                if record.is_none() {
                    debug!(account = %handle, index, "node has no post text, skipping");
                }
                record
            })
            .collect()
    }

    pub fn parse_node(&self, handle: &str, node: ElementRef<'_>) -> Option<PostRecord> {
        let text = node.select(&self.text).next().map(inner_text)?;
        if text.is_empty() {
            return None;
        }

        let timestamp = self.timestamp(handle, node);
        let permalink = self.permalink(handle, node);

        Some(PostRecord::new(handle, text, timestamp, permalink))
    }

    fn timestamp(&self, handle: &str, node: ElementRef<'_>) -> Option<String> {
        let raw = node
            .select(&self.time)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        if DateTime::parse_from_rfc3339(raw).is_err() {
            debug!(account = %handle, datetime = raw, "dropping unparsable datetime attribute");
            return None;
        }

        Some(raw.to_string())
    }

    fn permalink(&self, handle: &str, node: ElementRef<'_>) -> Option<String> {
        let href = node
            .select(&self.status_link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())?;

        let resolved = if href.starts_with("http://") || href.starts_with("https://") {
            Url::parse(href).ok()
        } else {
            self.origin.as_ref().and_then(|origin| origin.join(href).ok())
        };

        if resolved.is_none() {
            debug!(account = %handle, href, "dropping unresolvable status link");
        }

        resolved.map(String::from)
    }
}

// The selectors above are constants known to be valid.
fn fixed_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css}: {e}"))
}

/// Rendered text of an element: text nodes in order, `<br>` as a newline,
/// and `<img alt>` for emoji the site draws as images.
fn inner_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) if el.name() == "img" => {
                if let Some(alt) = el.attr("alt") {
                    out.push_str(alt);
                }
            }
            _ => {}
        }
    }

    out.trim().to_string()
}
