//! Test helpers for integration tests.
//!
//! Provides a local HTTP server serving RSS fixtures, document builders and
//! database setup helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use gator::config::FetcherConfig;
use gator::feed::{FeedRepository, NewFeed};
use gator::{Database, Feed, FeedFetcher, Ingestor, NewUser, User, UserRepository};

/// What the fixture server answers for a path.
#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with an RSS body.
    Rss(String),
    /// Empty response with the given status.
    Status(u16),
    /// Empty 200 sent after a delay.
    Slow(Duration),
}

#[derive(Clone, Default)]
struct ServerState {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

async fn serve(State(state): State<ServerState>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    *state.hits.lock().unwrap().entry(path.clone()).or_default() += 1;
    if let Some(agent) = headers.get(header::USER_AGENT) {
        state
            .user_agents
            .lock()
            .unwrap()
            .push(agent.to_str().unwrap_or_default().to_string());
    }

    let route = state.routes.lock().unwrap().get(&path).cloned();
    match route {
        Some(Route::Rss(body)) => {
            ([(header::CONTENT_TYPE, "application/rss+xml")], body).into_response()
        }
        Some(Route::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(Route::Slow(delay)) => {
            tokio::time::sleep(delay).await;
            StatusCode::OK.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Local HTTP server bound to an ephemeral port.
pub struct FeedServer {
    addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FeedServer {
    /// Start the server on the current runtime.
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new().fallback(serve).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Set the response for a path.
    pub fn route(&self, path: &str, route: Route) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), route);
    }

    /// Serve an RSS document at a path.
    pub fn rss(&self, path: &str, body: String) {
        self.route(path, Route::Rss(body));
    }

    /// Number of requests received for a path.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// User-Agent headers seen so far.
    pub fn user_agents(&self) -> Vec<String> {
        self.state.user_agents.lock().unwrap().clone()
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// One `<item>` of a fixture document.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// Item with a valid date.
pub fn item(title: &str, link: &str) -> TestItem {
    TestItem {
        title: title.to_string(),
        link: link.to_string(),
        description: format!("About {}", title),
        pub_date: "Mon, 02 Jan 2006 15:04:05 -0700".to_string(),
    }
}

/// Item with an explicit pubDate.
pub fn dated_item(title: &str, link: &str, pub_date: &str) -> TestItem {
    TestItem {
        pub_date: pub_date.to_string(),
        ..item(title, link)
    }
}

/// Build an RSS 2.0 document. Text is XML-escaped.
pub fn rss_document(title: &str, items: &[TestItem]) -> String {
    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n");
    doc.push_str(&format!("<title>{}</title>\n", xml_escape(title)));
    doc.push_str("<link>https://example.com/</link>\n");
    doc.push_str(&format!("<description>{} feed</description>\n", xml_escape(title)));
    for item in items {
        doc.push_str("<item>\n");
        doc.push_str(&format!("<title>{}</title>\n", xml_escape(&item.title)));
        doc.push_str(&format!("<link>{}</link>\n", xml_escape(&item.link)));
        doc.push_str(&format!(
            "<description>{}</description>\n",
            xml_escape(&item.description)
        ));
        doc.push_str(&format!("<pubDate>{}</pubDate>\n", xml_escape(&item.pub_date)));
        doc.push_str("</item>\n");
    }
    doc.push_str("</channel>\n</rss>\n");
    doc
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Fetcher settings with short timeouts.
pub fn test_fetcher_config() -> FetcherConfig {
    FetcherConfig {
        connect_timeout_secs: 2,
        total_timeout_secs: 5,
        ..FetcherConfig::default()
    }
}

/// In-memory database with migrations applied.
pub async fn memory_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

/// Create a user.
pub async fn create_user(db: &Database, name: &str) -> User {
    UserRepository::new(db.pool())
        .create(&NewUser::new(name))
        .await
        .unwrap()
}

/// Register a feed owned by `user`.
pub async fn create_feed(db: &Database, user: &User, name: &str, url: &str) -> Feed {
    FeedRepository::new(db.pool())
        .create(&NewFeed::new(name, url, user.id))
        .await
        .unwrap()
}

/// Ingestor over `db` with the test fetcher settings.
pub fn ingestor(db: &Database) -> Ingestor {
    ingestor_with(db, test_fetcher_config())
}

/// Ingestor over `db` with custom fetcher settings.
pub fn ingestor_with(db: &Database, config: FetcherConfig) -> Ingestor {
    Ingestor::new(db.clone(), FeedFetcher::new(&config).unwrap())
}
