//! Chromium-backed renderer using chromiumoxide.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::BrowserSettings;
use crate::renderer::{BrowserProfile, RenderContext, Renderer};

const CHROMIUM_ENV: &str = "POST_FEED_CHROMIUM_PATH";

/// Find a Chromium binary: config value, env override, then PATH.
///
/// `None` leaves detection to chromiumoxide.
pub fn find_chromium(settings: &BrowserSettings) -> Option<PathBuf> {
    if let Some(path) = &settings.executable {
        return Some(path.clone());
    }

    if let Ok(p) = std::env::var(CHROMIUM_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let path_var = std::env::var_os("PATH")?;
    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .flat_map(|name| std::env::split_paths(&path_var).map(move |dir| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

pub struct ChromiumRenderer {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance for the whole batch.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-sandbox");

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(path) = find_chromium(settings) {
            tracing::debug!(path = %path.display(), "using Chromium binary");
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self, profile: &BrowserProfile) -> Result<Box<dyn RenderContext>> {
        let mut browser = self.browser.lock().await;

        let context_id = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browser context")?;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build target params: {e}"))?;

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.dispose_browser_context(context_id).await;
                return Err(e).context("Failed to open page in browser context");
            }
        };
        drop(browser);

        let context = ChromiumContext {
            page,
            context_id,
            browser: Arc::clone(&self.browser),
        };

        // Close right away if the identity can't be applied.
        if let Err(e) = context.apply_profile(profile).await {
            let _ = Box::new(context).close().await;
            return Err(e);
        }

        Ok(Box::new(context))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.context("Failed to close Chromium")?;
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

pub struct ChromiumContext {
    page: Page,
    context_id: BrowserContextId,
    browser: Arc<Mutex<Browser>>,
}

impl ChromiumContext {
    async fn apply_profile(&self, profile: &BrowserProfile) -> Result<()> {
        self.page
            .execute(SetUserAgentOverrideParams::new(profile.user_agent.clone()))
            .await
            .context("Failed to set user agent")?;

        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(profile.viewport_width),
                i64::from(profile.viewport_height),
                1.0,
                false,
            ))
            .await
            .context("Failed to set viewport")?;

        Ok(())
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        // goto resolves once the load event fires
        self.page.goto(url).await.context("Page navigation failed")?;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read page content")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            page,
            context_id,
            browser,
        } = *self;

        let page_result = page.close().await;
        let dispose_result = browser
            .lock()
            .await
            .dispose_browser_context(context_id)
            .await;

        page_result.context("Failed to close page")?;
        dispose_result.context("Failed to dispose browser context")?;
        Ok(())
    }
}
