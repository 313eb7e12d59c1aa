//! Reddit search collection for VibeNet.
//!
//! Issues one `search.json` request per calendar month for a topic/year pair,
//! re-filters results into the month window, then ranks by upvotes,
//! deduplicates by text, and caps the result set.

pub mod client;
pub mod collector;
pub mod error;
pub mod types;
pub mod window;

pub use client::RedditSearchClient;
pub use collector::{rank_and_cap, CollectRequest, Collector};
pub use error::CollectorError;
pub use types::RedditPost;
pub use window::{month_windows, MonthWindow};
