//! Per-account extraction: open a context, load the profile page, locate and
//! parse posts, filter by age, and always tear the context down.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::filter::filter_recent;
use crate::locator::ElementLocator;
use crate::models::{AccountPosts, PostRecord};
use crate::parser::PostParser;
use crate::renderer::{BrowserProfile, RenderContext, Renderer, Timing};

pub const SITE_ORIGIN: &str = "https://x.com";

/// Canonical profile URL for a handle, or `None` when the handle is blank.
pub fn account_url(handle: &str) -> Option<String> {
    let handle = normalize_handle(handle);
    if handle.is_empty() {
        return None;
    }
    Some(format!("{}/{}", SITE_ORIGIN, urlencoding::encode(handle)))
}

fn normalize_handle(handle: &str) -> &str {
    handle.trim().trim_start_matches('@')
}

pub struct ExtractionSession<'r> {
    renderer: &'r dyn Renderer,
    profile: BrowserProfile,
    timing: Timing,
    locator: ElementLocator,
    parser: PostParser,
}

impl<'r> ExtractionSession<'r> {
    pub fn new(renderer: &'r dyn Renderer, profile: BrowserProfile, timing: Timing) -> Self {
        Self {
            renderer,
            profile,
            timing,
            locator: ElementLocator::default(),
            parser: PostParser::new(SITE_ORIGIN),
        }
    }

    pub fn with_locator(mut self, locator: ElementLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Process accounts one after another. Every account gets an entry, even when empty.
    pub async fn collect_all(
        &self,
        accounts: &[String],
        days_back: u32,
        now: DateTime<Utc>,
    ) -> Vec<AccountPosts> {
        let mut results = Vec::with_capacity(accounts.len());

        for account in accounts {
            let posts = self.extract_account(account).await;
            let extracted = posts.len();
            let retained = filter_recent(posts, days_back, now);

            info!(
                account = %account,
                extracted,
                retained = retained.len(),
                days_back,
                "account processed"
            );
            results.push(AccountPosts::new(normalize_handle(account), retained));
        }

        results
    }

    /// Extract posts for one account. Failures are logged and yield an empty list.
    pub async fn extract_account(&self, account: &str) -> Vec<PostRecord> {
        let Some(url) = account_url(account) else {
            warn!(account = %account, "skipping blank account handle");
            return Vec::new();
        };

        match self.load_page(&url).await {
            Ok(html) => self.extract_from_html(account, &html),
            Err(e) => {
                warn!(account = %account, stage = e.stage(), error = %e, "extraction failed");
                Vec::new()
            }
        }
    }

    /// Locate and parse posts in an already rendered page.
    pub fn extract_from_html(&self, account: &str, html: &str) -> Vec<PostRecord> {
        let document = scraper::Html::parse_document(html);
        let located = self.locator.locate(&document);

        match located.selector {
            Some(selector) => {
                debug!(account = %account, selector, count = located.nodes.len(), "posts located")
            }
            None => {
                info!(account = %account, "no posts located; page layout may have changed or requires login");
                return Vec::new();
            }
        }

        self.parser.parse(normalize_handle(account), &located.nodes)
    }

    async fn load_page(&self, url: &str) -> Result<String, ExtractError> {
        let mut context = self
            .renderer
            .new_context(&self.profile)
            .await
            .map_err(ExtractError::Context)?;

        let outcome = self.render(&mut context, url).await;

        if let Err(e) = context.close().await {
            warn!(url = %url, error = %e, "failed to close browser context");
        }

        outcome
    }

    async fn render(
        &self,
        context: &mut Box<dyn RenderContext>,
        url: &str,
    ) -> Result<String, ExtractError> {
        debug!(url = %url, "navigating");

        match tokio::time::timeout(self.timing.navigation_timeout, context.navigate(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                return Err(ExtractError::Navigation {
                    url: url.to_string(),
                    reason,
                })
            }
            Err(_) => {
                return Err(ExtractError::NavigationTimeout {
                    url: url.to_string(),
                    timeout: self.timing.navigation_timeout,
                })
            }
        }

        // Let client-side rendering finish.
        tokio::time::sleep(self.timing.settle).await;

        context.html().await.map_err(ExtractError::Snapshot)
    }
}
