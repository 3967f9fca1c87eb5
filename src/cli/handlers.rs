//! Built-in command handlers.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{info, warn};

use super::AppState;
use crate::datetime::format_utc_datetime;
use crate::db::{NewUser, User, UserRepository};
use crate::feed::{parse_interval, FeedFetcher, FeedService, Ingestor, Scheduler};
use crate::shutdown;
use crate::{GatorError, Result};

/// Posts shown by `browse` when no valid limit is given.
const DEFAULT_BROWSE_LIMIT: usize = 2;

/// Date format used when listing posts.
const POST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M %Z";

fn usage(text: &str) -> GatorError {
    GatorError::Validation(format!("usage: {}", text))
}

pub(super) fn register<'a>(state: &'a mut AppState, args: &'a [String]) -> BoxFuture<'a, Result<()>> {
    async move {
        let [name] = args else {
            return Err(usage("register <name>"));
        };

        let user = UserRepository::new(state.db.pool())
            .create(&NewUser::new(name.as_str()))
            .await?;
        state.session.set_user(&user.name);
        state.save_session()?;

        info!(user_id = user.id, "Registered user {}", user.name);
        state.console.println(format!("User {} created", user.name));
        Ok(())
    }
    .boxed()
}

pub(super) fn login<'a>(state: &'a mut AppState, args: &'a [String]) -> BoxFuture<'a, Result<()>> {
    async move {
        let [name] = args else {
            return Err(usage("login <name>"));
        };

        let user = UserRepository::new(state.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {}", name)))?;
        state.session.set_user(&user.name);
        state.save_session()?;

        state.console.println(format!("Logged in as {}", user.name));
        Ok(())
    }
    .boxed()
}

pub(super) fn users<'a>(state: &'a mut AppState, args: &'a [String]) -> BoxFuture<'a, Result<()>> {
    async move {
        if !args.is_empty() {
            return Err(usage("users"));
        }

        let users = UserRepository::new(state.db.pool()).list_all().await?;
        let current = state.session.current_user_name.clone();
        for user in users {
            if current.as_deref() == Some(user.name.as_str()) {
                state.console.println(format!("* {} (current)", user.name));
            } else {
                state.console.println(format!("* {}", user.name));
            }
        }
        Ok(())
    }
    .boxed()
}

pub(super) fn reset<'a>(state: &'a mut AppState, args: &'a [String]) -> BoxFuture<'a, Result<()>> {
    async move {
        if !args.is_empty() {
            return Err(usage("reset"));
        }

        let removed = UserRepository::new(state.db.pool()).delete_all().await?;
        state.session.clear();
        state.save_session()?;

        warn!("Database reset ({} users removed)", removed);
        state.console.println("Database reset");
        Ok(())
    }
    .boxed()
}

pub(super) fn agg<'a>(state: &'a mut AppState, args: &'a [String]) -> BoxFuture<'a, Result<()>> {
    async move {
        let [interval] = args else {
            return Err(usage("agg <time_between_reqs>"));
        };

        let requested = parse_interval(interval)?;
        let fetcher = FeedFetcher::new(&state.config.fetcher)?;
        let ingestor = Arc::new(Ingestor::new(state.db.clone(), fetcher));
        let scheduler = Scheduler::new(ingestor, requested)?;

        state
            .console
            .println(format!("Collecting feeds every {:?}", scheduler.interval()));

        let (trigger, signal) = shutdown::channel();
        let run = scheduler.run(signal);
        tokio::pin!(run);

        let summary = tokio::select! {
            summary = &mut run => summary,
            interrupted = tokio::signal::ctrl_c() => {
                match interrupted {
                    Ok(()) => info!("Interrupt received, stopping"),
                    Err(e) => warn!("Failed to listen for interrupt: {}", e),
                }
                trigger.trigger();
                run.await
            }
        };

        state.console.println(format!(
            "Stopped after {} ticks ({} failed)",
            summary.ticks, summary.failures
        ));
        Ok(())
    }
    .boxed()
}

pub(super) fn feeds<'a>(state: &'a mut AppState, args: &'a [String]) -> BoxFuture<'a, Result<()>> {
    async move {
        if !args.is_empty() {
            return Err(usage("feeds"));
        }

        let feeds = FeedService::new(&state.db).list_feeds().await?;
        if feeds.is_empty() {
            state.console.println("No feeds registered");
        }
        for entry in feeds {
            state.console.println(format!(
                "* {} ({}) added by {}",
                entry.feed.name, entry.feed.url, entry.owner_name
            ));
        }
        Ok(())
    }
    .boxed()
}

pub(super) fn add_feed<'a>(
    state: &'a mut AppState,
    user: &'a User,
    args: &'a [String],
) -> BoxFuture<'a, Result<()>> {
    async move {
        let [name, url] = args else {
            return Err(usage("addfeed <name> <url>"));
        };

        let (feed, follow) = FeedService::new(&state.db).add_feed(user, name, url).await?;

        info!(feed_id = feed.id, "Feed {} added by {}", feed.name, user.name);
        state.console.println("Feed added:");
        state.console.println(format!(" * ID:   {}", feed.id));
        state.console.println(format!(" * Name: {}", feed.name));
        state.console.println(format!(" * URL:  {}", feed.url));
        state
            .console
            .println(format!("{} now follows {}", follow.user_name, follow.feed_name));
        Ok(())
    }
    .boxed()
}

pub(super) fn follow<'a>(
    state: &'a mut AppState,
    user: &'a User,
    args: &'a [String],
) -> BoxFuture<'a, Result<()>> {
    async move {
        let [url] = args else {
            return Err(usage("follow <url>"));
        };

        let follow = FeedService::new(&state.db).follow(user, url).await?;
        state
            .console
            .println(format!("{} now follows {}", follow.user_name, follow.feed_name));
        Ok(())
    }
    .boxed()
}

pub(super) fn unfollow<'a>(
    state: &'a mut AppState,
    user: &'a User,
    args: &'a [String],
) -> BoxFuture<'a, Result<()>> {
    async move {
        let [url] = args else {
            return Err(usage("unfollow <url>"));
        };

        let feed = FeedService::new(&state.db).unfollow(user, url).await?;
        state
            .console
            .println(format!("{} unfollowed {}", user.name, feed.name));
        Ok(())
    }
    .boxed()
}

pub(super) fn following<'a>(
    state: &'a mut AppState,
    user: &'a User,
    args: &'a [String],
) -> BoxFuture<'a, Result<()>> {
    async move {
        if !args.is_empty() {
            return Err(usage("following"));
        }

        let follows = FeedService::new(&state.db).following(user).await?;
        if follows.is_empty() {
            state
                .console
                .println(format!("{} does not follow any feeds", user.name));
        }
        for follow in follows {
            state.console.println(format!("* {}", follow.feed_name));
        }
        Ok(())
    }
    .boxed()
}

pub(super) fn browse<'a>(
    state: &'a mut AppState,
    user: &'a User,
    args: &'a [String],
) -> BoxFuture<'a, Result<()>> {
    async move {
        let limit = match args {
            [] => DEFAULT_BROWSE_LIMIT,
            [raw] => raw
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_BROWSE_LIMIT),
            _ => return Err(usage("browse [limit]")),
        };

        let posts = FeedService::new(&state.db).browse(user, limit).await?;
        if posts.is_empty() {
            state.console.println("No posts yet");
        }

        let timezone = state.config.display.timezone.clone();
        for post in posts {
            let published = format_utc_datetime(&post.published_at, &timezone, POST_DATE_FORMAT);
            state.console.println(format!("--- {} ---", post.title));
            state.console.println(format!("    {}", published));
            if !post.description.is_empty() {
                state.console.println(format!("    {}", post.description));
            }
            state.console.println(format!("Link: {}", post.url));
        }
        Ok(())
    }
    .boxed()
}
