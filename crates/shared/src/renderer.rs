//! Browser seam used by the extraction session.
//!
//! `Renderer` hands out isolated contexts; `RenderContext` is one page living in
//! its own cookie/storage space. The Chromium implementation lives in
//! [`crate::chromium`]; tests drive the session through scripted doubles.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{BrowserSettings, DEFAULT_USER_AGENT};

/// Identity presented by every context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

impl From<&BrowserSettings> for BrowserProfile {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            viewport_width: settings.viewport_width,
            viewport_height: settings.viewport_height,
        }
    }
}

/// A browser engine that can open isolated contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh context with its own cookies and storage.
    async fn new_context(&self, profile: &BrowserProfile) -> Result<Box<dyn RenderContext>>;

    /// Shut the engine down once no more contexts are needed.
    async fn shutdown(&self) -> Result<()>;
}

/// One isolated page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Load `url` and wait for the page to settle. The caller bounds the call with its own timeout.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Serialized DOM of the rendered page.
    async fn html(&self) -> Result<String>;

    /// Release the page and its storage.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Fixed waits applied around each navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub navigation_timeout: Duration,
    pub settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(3),
        }
    }
}

impl From<&BrowserSettings> for Timing {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            navigation_timeout: settings.navigation_timeout(),
            settle: settings.settle_interval(),
        }
    }
}
