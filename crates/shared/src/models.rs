use serde::{Deserialize, Serialize};

/// One post extracted from an account page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub text: String,
    pub timestamp: Option<String>,
    pub permalink: Option<String>,
    source_handle: String,
}

impl PostRecord {
    pub fn new(
        source_handle: impl Into<String>,
        text: impl Into<String>,
        timestamp: Option<String>,
        permalink: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp,
            permalink,
            source_handle: source_handle.into(),
        }
    }

    pub fn source_handle(&self) -> &str {
        &self.source_handle
    }
}

/// Retained posts for one account, in extraction order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountPosts {
    pub account: String,
    pub posts: Vec<PostRecord>,
}

impl AccountPosts {
    pub fn new(account: impl Into<String>, posts: Vec<PostRecord>) -> Self {
        Self {
            account: account.into(),
            posts,
        }
    }

    pub fn empty(account: impl Into<String>) -> Self {
        Self::new(account, Vec::new())
    }
}

/// Per-account counts for the end-of-run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub per_account: Vec<(String, usize)>,
    pub total: usize,
}

impl CollectionStats {
    pub fn from_batches(batches: &[AccountPosts]) -> Self {
        let per_account: Vec<(String, usize)> = batches
            .iter()
            .map(|batch| (batch.account.clone(), batch.posts.len()))
            .collect();
        let total = per_account.iter().map(|(_, count)| count).sum();

        Self { per_account, total }
    }

    pub fn count_for(&self, account: &str) -> Option<usize> {
        self.per_account
            .iter()
            .find(|(name, _)| name == account)
            .map(|(_, count)| *count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_keep_empty_accounts() {
        let batches = vec![
            AccountPosts::new(
                "alice",
                vec![
                    PostRecord::new("alice", "one", None, None),
                    PostRecord::new("alice", "two", None, None),
                ],
            ),
            AccountPosts::empty("bob"),
        ];

        let stats = CollectionStats::from_batches(&batches);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.count_for("alice"), Some(2));
        assert_eq!(stats.count_for("bob"), Some(0));
        assert_eq!(stats.count_for("carol"), None);
        assert_eq!(stats.per_account[1].0, "bob");
    }
}
