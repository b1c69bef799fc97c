use std::time::Duration;

/// Why an account produced no page to extract from
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("could not open browser context: {0:#}")]
    Context(anyhow::Error),

    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason:#}")]
    Navigation { url: String, reason: anyhow::Error },

    #[error("could not read rendered page: {0:#}")]
    Snapshot(anyhow::Error),
}

impl ExtractError {
    /// Short stage label used in log fields
    pub fn stage(&self) -> &'static str {
        match self {
            ExtractError::Context(_) => "context",
            ExtractError::NavigationTimeout { .. } | ExtractError::Navigation { .. } => "navigation",
            ExtractError::Snapshot(_) => "snapshot",
        }
    }
}
