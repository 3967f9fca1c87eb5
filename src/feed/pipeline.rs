//! Ingestion pipeline: one feed per tick.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::fetcher::FeedFetcher;
use super::repository::{FeedRepository, PostRepository};
use super::rotation::RotationSelector;
use super::scheduler::IngestJob;
use super::types::{IngestResult, NewPost, DEFAULT_ITEM_TITLE};
use crate::datetime::parse_pub_date;
use crate::db::Database;
use crate::shutdown::ShutdownSignal;
use crate::{GatorError, Result};

/// Fetches the next feed in the rotation and stores its items as posts.
pub struct Ingestor {
    db: Database,
    fetcher: FeedFetcher,
}

impl Ingestor {
    /// Create a new ingestor.
    pub fn new(db: Database, fetcher: FeedFetcher) -> Self {
        Self { db, fetcher }
    }

    async fn collect_next(&self) -> Result<IngestResult> {
        let pool = self.db.pool();

        let feed = match RotationSelector::new(pool).select_next_feed().await {
            Ok(feed) => feed,
            Err(GatorError::NoFeeds) => return Ok(IngestResult::empty()),
            Err(e) => return Err(e),
        };

        // Stamped before fetching so a failing feed still moves to the back.
        FeedRepository::new(pool)
            .mark_fetched(feed.id, Utc::now())
            .await?;

        info!(feed_id = feed.id, name = %feed.name, url = %feed.url, "Fetching feed");
        let parsed = self.fetcher.fetch(&feed.url).await?;

        let mut result = IngestResult {
            feed_id: Some(feed.id),
            feed_name: Some(feed.name.clone()),
            items_seen: parsed.items.len(),
            ..IngestResult::default()
        };

        let posts = PostRepository::new(pool);
        for item in parsed.items {
            let published_at = parse_pub_date(&item.pub_date)?;
            let title = if item.title.is_empty() {
                DEFAULT_ITEM_TITLE.to_string()
            } else {
                item.title
            };

            let new_post = NewPost {
                title,
                url: item.link,
                description: item.description,
                published_at,
                feed_id: feed.id,
            };

            match posts.insert_if_absent(&new_post).await {
                Ok(Some(id)) => {
                    debug!(post_id = id, url = %new_post.url, "Stored post");
                    result.items_inserted += 1;
                }
                Ok(None) => {
                    result.items_skipped += 1;
                }
                Err(e) => {
                    warn!(url = %new_post.url, "Failed to store post: {}", e);
                    result.items_failed += 1;
                    result.items_skipped += 1;
                }
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl IngestJob for Ingestor {
    async fn ingest_once(&self, shutdown: &ShutdownSignal) -> Result<IngestResult> {
        tokio::select! {
            biased;
            _ = shutdown.triggered() => Err(GatorError::Cancelled),
            result = self.collect_next() => result,
        }
    }
}
