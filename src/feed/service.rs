//! Feed service for Gator.
//!
//! High-level feed operations used by the command handlers: registering
//! feeds, following and unfollowing them, and browsing collected posts.

use super::repository::{FeedFollowRepository, FeedRepository, PostRepository};
use super::types::{Feed, FeedFollowDetails, FeedWithOwner, NewFeed, Post};
use crate::db::{Database, User};
use crate::{GatorError, Result};

/// Validate a feed URL.
///
/// The URL must parse and use the http or https scheme with a host.
pub fn validate_feed_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| GatorError::Validation(format!("invalid URL {}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatorError::Validation(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(GatorError::Validation(format!("URL has no host: {}", url)));
    }

    Ok(())
}

/// Service for feed operations.
pub struct FeedService<'a> {
    db: &'a Database,
}

impl<'a> FeedService<'a> {
    /// Create a new FeedService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a feed and make its owner follow it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is empty, the URL is not an
    /// http(s) URL, or a feed with the same URL already exists.
    pub async fn add_feed(
        &self,
        user: &User,
        name: &str,
        url: &str,
    ) -> Result<(Feed, FeedFollowDetails)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatorError::Validation("feed name is empty".to_string()));
        }
        validate_feed_url(url)?;

        let feed = FeedRepository::new(self.db.pool())
            .create(&NewFeed::new(name, url, user.id))
            .await?;
        let follow = FeedFollowRepository::new(self.db.pool())
            .create(user.id, feed.id)
            .await?;

        Ok((feed, follow))
    }

    /// List every feed with its owner's name.
    pub async fn list_feeds(&self) -> Result<Vec<FeedWithOwner>> {
        FeedRepository::new(self.db.pool()).list_with_owner().await
    }

    /// Follow an existing feed by URL.
    pub async fn follow(&self, user: &User, url: &str) -> Result<FeedFollowDetails> {
        let feed = self.feed_by_url(url).await?;
        FeedFollowRepository::new(self.db.pool())
            .create(user.id, feed.id)
            .await
    }

    /// Stop following a feed. Returns the feed that was unfollowed.
    pub async fn unfollow(&self, user: &User, url: &str) -> Result<Feed> {
        let feed = self.feed_by_url(url).await?;
        let deleted = FeedFollowRepository::new(self.db.pool())
            .delete(user.id, feed.id)
            .await?;
        if !deleted {
            return Err(GatorError::NotFound(format!("follow of {}", url)));
        }
        Ok(feed)
    }

    /// Feeds the user follows.
    pub async fn following(&self, user: &User) -> Result<Vec<FeedFollowDetails>> {
        FeedFollowRepository::new(self.db.pool())
            .list_for_user(user.id)
            .await
    }

    /// Newest posts from the feeds the user follows.
    pub async fn browse(&self, user: &User, limit: usize) -> Result<Vec<Post>> {
        PostRepository::new(self.db.pool())
            .list_for_user(user.id, limit)
            .await
    }

    async fn feed_by_url(&self, url: &str) -> Result<Feed> {
        FeedRepository::new(self.db.pool())
            .get_by_url(url)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};

    async fn setup() -> (Database, User, User) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let alice = repo.create(&NewUser::new("alice")).await.unwrap();
        let bob = repo.create(&NewUser::new("bob")).await.unwrap();
        (db, alice, bob)
    }

    #[test]
    fn test_validate_feed_url() {
        assert!(validate_feed_url("https://example.com/feed.xml").is_ok());
        assert!(validate_feed_url("http://localhost:8080/rss").is_ok());

        for bad in ["ftp://example.com/feed", "not a url", "file:///etc/passwd", ""] {
            let err = validate_feed_url(bad).unwrap_err();
            assert!(matches!(err, GatorError::Validation(_)), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_add_feed_follows_automatically() {
        let (db, alice, _) = setup().await;
        let service = FeedService::new(&db);

        let (feed, follow) = service
            .add_feed(&alice, "Blog", "https://example.com/rss")
            .await
            .unwrap();
        assert_eq!(feed.user_id, alice.id);
        assert_eq!(follow.follow.feed_id, feed.id);
        assert_eq!(follow.user_name, "alice");

        let following = service.following(&alice).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].feed_name, "Blog");
    }

    #[tokio::test]
    async fn test_add_feed_rejects_bad_input() {
        let (db, alice, _) = setup().await;
        let service = FeedService::new(&db);

        let err = service
            .add_feed(&alice, "  ", "https://example.com/rss")
            .await
            .unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));

        let err = service
            .add_feed(&alice, "Blog", "gopher://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));

        service
            .add_feed(&alice, "Blog", "https://example.com/rss")
            .await
            .unwrap();
        let err = service
            .add_feed(&alice, "Again", "https://example.com/rss")
            .await
            .unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));
        assert_eq!(service.list_feeds().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_follow_and_unfollow_by_url() {
        let (db, alice, bob) = setup().await;
        let service = FeedService::new(&db);
        let url = "https://example.com/rss";

        service.add_feed(&alice, "Blog", url).await.unwrap();

        let follow = service.follow(&bob, url).await.unwrap();
        assert_eq!(follow.user_name, "bob");
        assert_eq!(follow.feed_name, "Blog");

        let err = service.follow(&bob, url).await.unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));

        let feed = service.unfollow(&bob, url).await.unwrap();
        assert_eq!(feed.name, "Blog");
        assert!(service.following(&bob).await.unwrap().is_empty());

        let err = service.unfollow(&bob, url).await.unwrap_err();
        assert!(matches!(err, GatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_follow_unknown_feed() {
        let (db, alice, _) = setup().await;
        let service = FeedService::new(&db);

        let err = service
            .follow(&alice, "https://missing.example/rss")
            .await
            .unwrap_err();
        assert!(matches!(err, GatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_feeds_shows_owner() {
        let (db, alice, bob) = setup().await;
        let service = FeedService::new(&db);

        service
            .add_feed(&alice, "A", "https://a.example/rss")
            .await
            .unwrap();
        service
            .add_feed(&bob, "B", "https://b.example/rss")
            .await
            .unwrap();

        let feeds = service.list_feeds().await.unwrap();
        let owners: Vec<(&str, &str)> = feeds
            .iter()
            .map(|f| (f.feed.name.as_str(), f.owner_name.as_str()))
            .collect();
        assert_eq!(owners, vec![("A", "alice"), ("B", "bob")]);
    }

    #[tokio::test]
    async fn test_browse_empty() {
        let (db, alice, _) = setup().await;
        let service = FeedService::new(&db);
        assert!(service.browse(&alice, 2).await.unwrap().is_empty());
    }
}
