//! Command-line front end for Gator.
//!
//! Commands are looked up by name in an explicit dispatch table. Commands
//! that need a logged-in user receive the resolved [`User`] from the
//! dispatcher.

mod handlers;
mod session;

pub use session::Session;

use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;

use futures::future::BoxFuture;

use crate::config::Config;
use crate::db::{Database, User, UserRepository};
use crate::{GatorError, Result};

/// Handler for a command anyone may run.
pub type PublicHandler = for<'a> fn(&'a mut AppState, &'a [String]) -> BoxFuture<'a, Result<()>>;

/// Handler for a command that needs the current user.
pub type LoggedInHandler =
    for<'a> fn(&'a mut AppState, &'a User, &'a [String]) -> BoxFuture<'a, Result<()>>;

/// A registered command handler.
#[derive(Clone, Copy)]
pub enum Handler {
    /// Runs without a session user.
    Public(PublicHandler),
    /// Runs only when a user is logged in.
    LoggedIn(LoggedInHandler),
}

/// Where command output goes.
#[derive(Debug, Default)]
pub struct Console {
    captured: Option<Vec<String>>,
}

impl Console {
    /// Print to stdout.
    pub fn stdout() -> Self {
        Self { captured: None }
    }

    /// Keep lines in memory instead of printing them.
    pub fn captured() -> Self {
        Self {
            captured: Some(Vec::new()),
        }
    }

    /// Emit one line.
    pub fn println(&mut self, line: impl Display) {
        match &mut self.captured {
            Some(lines) => lines.push(line.to_string()),
            None => println!("{}", line),
        }
    }

    /// Captured lines (empty when printing to stdout).
    pub fn lines(&self) -> &[String] {
        self.captured.as_deref().unwrap_or_default()
    }
}

/// State shared by every command of one invocation.
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// Open database.
    pub db: Database,
    /// Current session.
    pub session: Session,
    /// Session file location.
    pub session_path: PathBuf,
    /// Output sink.
    pub console: Console,
}

impl AppState {
    /// Create state for one invocation.
    pub fn new(config: Config, db: Database, session: Session, console: Console) -> Self {
        let session_path = PathBuf::from(&config.session.path);
        Self {
            config,
            db,
            session,
            session_path,
            console,
        }
    }

    /// Persist the session to its file.
    pub fn save_session(&self) -> Result<()> {
        self.session.save(&self.session_path)
    }

    /// Resolve the session user.
    pub async fn current_user(&self) -> Result<User> {
        let name = self
            .session
            .current_user_name
            .as_deref()
            .ok_or(GatorError::NotLoggedIn)?;

        UserRepository::new(self.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {}", name)))
    }
}

/// Command dispatch table.
#[derive(Default)]
pub struct Commands {
    handlers: HashMap<&'static str, Handler>,
}

impl Commands {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every built-in command.
    pub fn builtin() -> Self {
        let mut commands = Self::new();
        commands.register("register", Handler::Public(handlers::register));
        commands.register("login", Handler::Public(handlers::login));
        commands.register("users", Handler::Public(handlers::users));
        commands.register("reset", Handler::Public(handlers::reset));
        commands.register("agg", Handler::Public(handlers::agg));
        commands.register("feeds", Handler::Public(handlers::feeds));
        commands.register("addfeed", Handler::LoggedIn(handlers::add_feed));
        commands.register("follow", Handler::LoggedIn(handlers::follow));
        commands.register("unfollow", Handler::LoggedIn(handlers::unfollow));
        commands.register("following", Handler::LoggedIn(handlers::following));
        commands.register("browse", Handler::LoggedIn(handlers::browse));
        commands
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(&mut self, name: &'static str, handler: Handler) {
        self.handlers.insert(name, handler);
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run a command.
    pub async fn run(&self, state: &mut AppState, name: &str, args: &[String]) -> Result<()> {
        let handler = self
            .handlers
            .get(name)
            .copied()
            .ok_or_else(|| GatorError::Validation(format!("unknown command: {}", name)))?;

        match handler {
            Handler::Public(f) => f(state, args).await,
            Handler::LoggedIn(f) => {
                let user = state.current_user().await?;
                f(state, &user, args).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let names = Commands::builtin().names();
        assert_eq!(
            names,
            vec![
                "addfeed", "agg", "browse", "feeds", "follow", "following", "login", "register",
                "reset", "unfollow", "users"
            ]
        );
    }

    #[test]
    fn test_console_capture() {
        let mut console = Console::captured();
        console.println("one");
        console.println(2);
        assert_eq!(console.lines(), ["one", "2"]);

        assert!(Console::stdout().lines().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.session.path = dir.path().join("session.json").display().to_string();
        let db = Database::open_in_memory().await.unwrap();
        let mut state = AppState::new(config, db, Session::default(), Console::captured());

        let err = Commands::builtin()
            .run(&mut state, "frobnicate", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GatorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_logged_in_command_without_session() {
        let db = Database::open_in_memory().await.unwrap();
        let mut state = AppState::new(
            Config::default(),
            db,
            Session::default(),
            Console::captured(),
        );

        let err = Commands::builtin()
            .run(&mut state, "following", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GatorError::NotLoggedIn));
    }
}
