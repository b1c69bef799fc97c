//! End-to-end runs of the collection pipeline against a scripted renderer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use shared::{
    item_guid, save_feed, BrowserProfile, CollectionStats, ElementLocator, ExtractionSession,
    FeedDocument, RenderContext, Renderer, Timing,
};

// ─────────────────────── helpers ───────────────────────

#[derive(Clone)]
enum PageScript {
    Html(String),
    Timeout,
    DnsFailure,
}

/// Serves canned pages keyed by URL and records every context it opens and closes.
#[derive(Default)]
struct ScriptedRenderer {
    pages: HashMap<String, PageScript>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRenderer {
    fn page(mut self, handle: &str, script: PageScript) -> Self {
        self.pages.insert(format!("https://x.com/{}", handle), script);
        self
    }

    fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

struct ScriptedContext {
    pages: HashMap<String, PageScript>,
    current: Option<PageScript>,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_context(&self, _profile: &BrowserProfile) -> Result<Box<dyn RenderContext>> {
        self.log.lock().unwrap().push("open".to_string());
        Ok(Box::new(ScriptedContext {
            pages: self.pages.clone(),
            current: None,
            log: Arc::clone(&self.log),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("goto {}", url));
        match self.pages.get(url).cloned() {
            Some(PageScript::Timeout) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
            Some(PageScript::DnsFailure) | None => anyhow::bail!("net::ERR_NAME_NOT_RESOLVED"),
            Some(page) => {
                self.current = Some(page);
                Ok(())
            }
        }
    }

    async fn html(&self) -> Result<String> {
        match &self.current {
            Some(PageScript::Html(html)) => Ok(html.clone()),
            _ => anyhow::bail!("no page loaded"),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.lock().unwrap().push("close".to_string());
        Ok(())
    }
}

fn timing() -> Timing {
    Timing {
        navigation_timeout: Duration::from_millis(100),
        settle: Duration::from_millis(1),
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

fn built_at() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 19, 14, 0, 0)
        .unwrap()
}

fn article(handle: &str, id: u32, text: &str, datetime: Option<&str>) -> String {
    let time = datetime
        .map(|dt| format!(r#"<time datetime="{}">t</time>"#, dt))
        .unwrap_or_default();
    format!(
        r#"<article role="article">
            <div data-testid="tweetText">{text}</div>
            <a href="/{handle}/status/{id}">{time}</a>
        </article>"#
    )
}

fn profile_page(articles: &[String]) -> PageScript {
    PageScript::Html(format!(
        "<html><body><main>{}</main></body></html>",
        articles.join("\n")
    ))
}

fn accounts(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn failed_account_does_not_affect_the_next_one() {
    let renderer = ScriptedRenderer::default()
        .page("alice", PageScript::Timeout)
        .page(
            "bob",
            profile_page(&[
                article("bob", 1, "one", Some("2026-10-19T10:00:00Z")),
                article("bob", 2, "two", None),
                article("bob", 3, "three", Some("2026-10-19T11:00:00Z")),
            ]),
        );
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing());

    let batches = session
        .collect_all(&accounts(&["alice", "bob"]), 1, now())
        .await;

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].account, "alice");
    assert!(batches[0].posts.is_empty());
    assert_eq!(batches[1].account, "bob");
    let texts: Vec<&str> = batches[1].posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn contexts_are_opened_and_closed_one_account_at_a_time() {
    let renderer = ScriptedRenderer::default()
        .page("alice", PageScript::DnsFailure)
        .page("bob", profile_page(&[article("bob", 1, "hi", None)]))
        .page("carol", PageScript::Timeout);
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing());

    session
        .collect_all(&accounts(&["alice", "bob", "carol"]), 1, now())
        .await;

    assert_eq!(
        renderer.events(),
        vec![
            "open",
            "goto https://x.com/alice",
            "close",
            "open",
            "goto https://x.com/bob",
            "close",
            "open",
            "goto https://x.com/carol",
            "close",
        ]
    );
}

#[tokio::test]
async fn stale_posts_are_dropped_and_empty_accounts_still_counted() {
    let renderer = ScriptedRenderer::default()
        .page(
            "alice",
            profile_page(&[
                article("alice", 1, "fresh", Some("2026-10-18T12:00:00Z")),
                article("alice", 2, "stale", Some("2026-10-18T11:59:59Z")),
            ]),
        )
        .page(
            "bob",
            profile_page(&[article("bob", 9, "last week", Some("2026-10-12T09:00:00Z"))]),
        )
        .page("carol", PageScript::Html("<p>Log in</p>".to_string()));
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing());

    let batches = session
        .collect_all(&accounts(&["alice", "bob", "carol"]), 1, now())
        .await;
    let stats = CollectionStats::from_batches(&batches);

    assert_eq!(stats.total, 1);
    assert_eq!(stats.count_for("alice"), Some(1));
    assert_eq!(stats.count_for("bob"), Some(0));
    assert_eq!(stats.count_for("carol"), Some(0));

    let feed = FeedDocument::build(&batches, built_at());
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].title, "@alice: fresh");
}

#[tokio::test]
async fn repeated_runs_produce_identical_items() {
    let renderer = ScriptedRenderer::default().page(
        "alice",
        profile_page(&[
            article("alice", 1, "same text", Some("2026-10-19T08:00:00Z")),
            article("alice", 2, "same text", Some("2026-10-19T07:00:00Z")),
        ]),
    );
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing());

    let first = FeedDocument::build(
        &session.collect_all(&accounts(&["alice"]), 1, now()).await,
        built_at(),
    );
    let later_build = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 19, 18, 0, 0)
        .unwrap();
    let second = FeedDocument::build(
        &session.collect_all(&accounts(&["alice"]), 1, now()).await,
        later_build,
    );

    assert_eq!(first.items, second.items);
    assert_ne!(first.last_build_date, second.last_build_date);
    assert_eq!(first.items[0].guid, item_guid("alice", "same text", 0));
    assert_eq!(first.items[1].guid, item_guid("alice", "same text", 1));
    assert_ne!(first.items[0].guid, first.items[1].guid);

    let strip_build_date = |xml: String| {
        xml.lines()
            .filter(|line| !line.contains("<lastBuildDate>"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(
        strip_build_date(first.to_xml().unwrap()),
        strip_build_date(second.to_xml().unwrap())
    );
}

#[tokio::test]
async fn feed_file_is_written_for_the_run_date() {
    let renderer = ScriptedRenderer::default().page(
        "alice",
        profile_page(&[article(
            "alice",
            42,
            &"a".repeat(150),
            Some("2026-10-19T09:15:00.000Z"),
        )]),
    );
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing());
    let batches = session.collect_all(&accounts(&["@alice"]), 1, now()).await;
    let feed = FeedDocument::build(&batches, built_at());
    let dir = tempfile::tempdir().unwrap();

    let path = save_feed(&feed, dir.path(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).unwrap();

    assert!(path.ends_with("twitter-feed-2026-10-19.xml"));
    let xml = std::fs::read_to_string(path).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains(&format!("<title>@alice: {}...</title>", "a".repeat(100))));
    assert!(xml.contains(&format!("<description>{}</description>", "a".repeat(150))));
    assert!(xml.contains("<link>https://x.com/alice/status/42</link>"));
    assert!(xml.contains("<pubDate>Mon, 19 Oct 2026 09:15:00 +0000</pubDate>"));
    assert!(xml.contains("<author>@alice</author>"));
    assert!(xml.contains("<lastBuildDate>Mon, 19 Oct 2026 14:00:00 +0200</lastBuildDate>"));
}

#[tokio::test]
async fn selector_fallback_reaches_older_markup() {
    let page = PageScript::Html(
        r#"<div class="timeline">
            <div class="tweet"><p data-testid="tweetText">legacy one</p></div>
            <div class="tweet"><p data-testid="tweetText">legacy two</p></div>
            <div class="tweet"><p data-testid="tweetText">legacy three</p></div>
        </div>"#
            .to_string(),
    );
    let renderer = ScriptedRenderer::default().page("alice", page);
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing());

    let posts = session.extract_account("alice").await;

    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|p| p.timestamp.is_none() && p.permalink.is_none()));
}

#[tokio::test]
async fn custom_locator_replaces_the_default_candidates() {
    let page = PageScript::Html(
        r#"<section class="post"><p data-testid="tweetText">from a mirror</p></section>
           <div class="tweet"><p data-testid="tweetText">legacy</p></div>"#
            .to_string(),
    );
    let renderer = ScriptedRenderer::default().page("alice", page);
    let locator = ElementLocator::new(vec!["div[[broken", "section.post", ".tweet"]);
    let session = ExtractionSession::new(&renderer, BrowserProfile::default(), timing())
        .with_locator(locator);

    let posts = session.extract_account("alice").await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "from a mirror");
}
