use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// Post containers, most specific first.
pub const DEFAULT_POST_SELECTORS: &[&str] = &[
    r#"article[role="article"]"#,
    r#"[data-testid="tweet"]"#,
    ".tweet",
    r#"[role="article"]"#,
];

/// Nodes found by the first selector that matched anything
#[derive(Debug)]
pub struct Located<'a> {
    pub selector: Option<&'static str>,
    pub nodes: Vec<ElementRef<'a>>,
}

impl Located<'_> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Tries each candidate selector in order and keeps the first non-empty match set.
#[derive(Debug, Clone)]
pub struct ElementLocator {
    candidates: Vec<&'static str>,
}

impl Default for ElementLocator {
    fn default() -> Self {
        Self::new(DEFAULT_POST_SELECTORS.to_vec())
    }
}

impl ElementLocator {
    pub fn new(candidates: Vec<&'static str>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[&'static str] {
        &self.candidates
    }

    pub fn locate<'a>(&self, document: &'a Html) -> Located<'a> {
        for &candidate in &self.candidates {
            // A selector that doesn't compile is just another miss.
            let selector = match Selector::parse(candidate) {
                Ok(selector) => selector,
                Err(e) => {
                    trace!(selector = candidate, error = %e, "selector rejected");
                    continue;
                }
            };

            let nodes: Vec<ElementRef<'a>> = document.select(&selector).collect();
            if !nodes.is_empty() {
                return Located {
                    selector: Some(candidate),
                    nodes,
                };
            }
            trace!(selector = candidate, "selector matched nothing");
        }

        Located {
            selector: None,
            nodes: Vec::new(),
        }
    }
}
