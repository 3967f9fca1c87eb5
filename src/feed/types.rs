//! Feed types for Gator.

use chrono::{DateTime, Utc};

/// Title stored for items that carry none.
pub const DEFAULT_ITEM_TITLE: &str = "No Title";

/// An RSS feed registered by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Display name chosen by the user.
    pub name: String,
    /// Feed URL (unique).
    pub url: String,
    /// User who added the feed.
    pub user_id: i64,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed row was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last time the ingestion pipeline picked this feed. `None` if never.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Owner.
    pub user_id: i64,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: i64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// A feed together with the name of the user who added it.
#[derive(Debug, Clone)]
pub struct FeedWithOwner {
    /// The feed.
    pub feed: Feed,
    /// Name of the owning user.
    pub owner_name: String,
}

/// A user following a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: i64,
    /// Following user.
    pub user_id: i64,
    /// Followed feed.
    pub feed_id: i64,
    /// When the follow was created.
    pub created_at: DateTime<Utc>,
    /// When the follow was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A follow joined with the user and feed names.
#[derive(Debug, Clone)]
pub struct FeedFollowDetails {
    /// The follow row.
    pub follow: FeedFollow,
    /// Name of the following user.
    pub user_name: String,
    /// Name of the followed feed.
    pub feed_name: String,
}

/// An ingested post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: i64,
    /// Item title.
    pub title: String,
    /// Item URL (unique across all feeds).
    pub url: String,
    /// Item description.
    pub description: String,
    /// Publication time from the feed.
    pub published_at: DateTime<Utc>,
    /// Feed the post came from.
    pub feed_id: i64,
    /// When the post was stored.
    pub created_at: DateTime<Utc>,
    /// Same as `created_at`; posts are immutable.
    pub updated_at: DateTime<Utc>,
}

/// New post for insertion.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Item title.
    pub title: String,
    /// Item URL.
    pub url: String,
    /// Item description.
    pub description: String,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// Source feed.
    pub feed_id: i64,
}

/// Parsed channel from an RSS document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Items in document order.
    pub items: Vec<ParsedItem>,
}

/// Parsed item from an RSS document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItem {
    /// Item title (may be empty).
    pub title: String,
    /// Item link.
    pub link: String,
    /// Item description.
    pub description: String,
    /// Raw `pubDate` text (empty when absent).
    pub pub_date: String,
}

/// Outcome of one ingestion tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestResult {
    /// Feed that was fetched. `None` when the rotation was empty.
    pub feed_id: Option<i64>,
    /// Name of the fetched feed.
    pub feed_name: Option<String>,
    /// Items present in the fetched document.
    pub items_seen: usize,
    /// Items stored as new posts.
    pub items_inserted: usize,
    /// Items not stored: url already known, or insert failed.
    pub items_skipped: usize,
    /// Subset of `items_skipped` whose insert failed with a store error.
    pub items_failed: usize,
}

impl IngestResult {
    /// Result for a tick that found no feed to fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the tick fetched nothing.
    pub fn is_empty(&self) -> bool {
        self.feed_id.is_none()
    }
}
