//! Gator - A command-line RSS feed aggregator.
//!
//! Users register feeds and follow them; a periodic collector fetches one
//! feed per tick in least-recently-fetched order and stores new items as
//! posts, deduplicated by URL.

pub mod cli;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod shutdown;

pub use cli::{AppState, Commands, Console, Session};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{GatorError, NetworkError, Result};
pub use feed::{
    Feed, FeedFetcher, FeedService, IngestJob, IngestResult, Ingestor, Post, RotationSelector,
    Scheduler, SchedulerState, SchedulerSummary,
};
