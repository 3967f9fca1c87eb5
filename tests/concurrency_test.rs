//! Concurrency tests for Gator.
//!
//! Uniqueness of post URLs and follows is enforced by the store, so
//! concurrent writers racing on the same key must produce exactly one row.

mod common;

use std::sync::Arc;

use chrono::Utc;

use common::{create_feed, create_user};
use gator::feed::{FeedFollowRepository, NewPost, PostRepository};
use gator::{Database, GatorError};

/// Open a file-backed database so the pool has several connections.
async fn setup_file_db(dir: &tempfile::TempDir) -> Arc<Database> {
    Arc::new(Database::open(dir.path().join("gator.db")).await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_insert_same_url() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let user = create_user(&db, "alice").await;
    let feed = create_feed(&db, &user, "Blog", "https://blog.example/rss").await;

    const WRITERS: usize = 8;

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let db = Arc::clone(&db);
        let feed_id = feed.id;
        handles.push(tokio::spawn(async move {
            PostRepository::new(db.pool())
                .insert_if_absent(&NewPost {
                    title: format!("Writer {}", i),
                    url: "https://blog.example/shared".to_string(),
                    description: String::new(),
                    published_at: Utc::now(),
                    feed_id,
                })
                .await
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_some() {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1, "exactly one writer must win");
    assert_eq!(
        PostRepository::new(db.pool())
            .count_by_feed(feed.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_follow_same_feed() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let owner = create_user(&db, "owner").await;
    let follower = create_user(&db, "follower").await;
    let feed = create_feed(&db, &owner, "Blog", "https://blog.example/rss").await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let db = Arc::clone(&db);
        let (user_id, feed_id) = (follower.id, feed.id);
        handles.push(tokio::spawn(async move {
            FeedFollowRepository::new(db.pool())
                .create(user_id, feed_id)
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(GatorError::Validation(_)) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(created, 1);
    let follows = FeedFollowRepository::new(db.pool())
        .list_for_user(follower.id)
        .await
        .unwrap();
    assert_eq!(follows.len(), 1);
}
