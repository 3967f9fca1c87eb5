//! Rotation selector: picks the next feed to fetch.

use super::repository::FeedRepository;
use super::types::Feed;
use crate::db::DbPool;
use crate::{GatorError, Result};

/// Chooses the feed that has waited longest since its last fetch.
pub struct RotationSelector<'a> {
    pool: &'a DbPool,
}

impl<'a> RotationSelector<'a> {
    /// Create a new selector.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Select the next feed.
    ///
    /// Never-fetched feeds come first, then the oldest `last_fetched_at`;
    /// ties go to the lowest id. Fails with [`GatorError::NoFeeds`] when no
    /// feed is registered.
    pub async fn select_next_feed(&self) -> Result<Feed> {
        FeedRepository::new(self.pool)
            .get_least_recently_fetched()
            .await?
            .ok_or(GatorError::NoFeeds)
    }
}
