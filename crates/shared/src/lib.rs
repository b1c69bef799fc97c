// Public modules
pub mod chromium;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod io;
pub mod locator;
pub mod models;
pub mod parser;
pub mod renderer;
pub mod session;

// Re-export commonly used types
pub use chromium::ChromiumRenderer;
pub use config::{BrowserSettings, Config};
pub use error::ExtractError;
pub use feed::{item_guid, FeedDocument, FeedItem};
pub use filter::filter_recent;
pub use io::{feed_filename, save_feed};
pub use locator::{ElementLocator, Located};
pub use models::{AccountPosts, CollectionStats, PostRecord};
pub use parser::PostParser;
pub use renderer::{BrowserProfile, RenderContext, Renderer, Timing};
pub use session::ExtractionSession;
