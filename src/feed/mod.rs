//! Feed aggregation for Gator.
//!
//! Feed registration and following, the fetch rotation, the ingestion
//! pipeline and the periodic scheduler that drives it.

pub mod fetcher;
pub mod pipeline;
pub mod repository;
pub mod rotation;
pub mod scheduler;
pub mod service;
pub mod types;

pub use fetcher::{parse_feed, unescape_html, FeedFetcher};
pub use pipeline::Ingestor;
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use rotation::RotationSelector;
pub use scheduler::{
    effective_interval, parse_interval, IngestJob, Scheduler, SchedulerState, SchedulerSummary,
    MIN_INTERVAL,
};
pub use service::{validate_feed_url, FeedService};
pub use types::{
    Feed, FeedFollow, FeedFollowDetails, FeedWithOwner, IngestResult, NewFeed, NewPost,
    ParsedFeed, ParsedItem, Post, DEFAULT_ITEM_TITLE,
};
