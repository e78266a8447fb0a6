//! Test doubles: a local HTTP server standing in for the listing endpoint
//! and file host, and an in-memory remote.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use serde_json::json;
use tokio::sync::Semaphore;

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::sync::{Remote, SyncProgress, SyncStatus};

/// Remote folder tree served by [`TestServer`].
#[derive(Default)]
pub struct RemoteTree {
    listings: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    truncated: HashSet<String>,
}

impl RemoteTree {
    /// Sets the names returned when listing `prefix` (`""` for the root).
    pub fn folder(&mut self, prefix: &str, names: &[&str]) {
        self.listings.insert(
            prefix.to_string(),
            names.iter().map(ToString::to_string).collect(),
        );
    }

    pub fn file(&mut self, name: &str, body: Vec<u8>) {
        self.files.insert(name.to_string(), body);
    }

    /// Makes listing `prefix` answer 500.
    pub fn fail_listing(&mut self, prefix: &str) {
        self.failing.insert(prefix.to_string());
    }

    /// Makes downloads of `name` send half the body, then drop the connection.
    pub fn truncate(&mut self, name: &str) {
        self.truncated.insert(name.to_string());
    }

    pub fn heal(&mut self, name: &str) {
        self.truncated.remove(name);
    }
}

struct ServerState {
    base: String,
    tree: Mutex<RemoteTree>,
    listed: Mutex<Vec<Option<String>>>,
    downloads: Mutex<HashMap<String, usize>>,
}

type Shared = Arc<ServerState>;

pub struct TestServer {
    state: Shared,
}

/// Deterministic body of `len` bytes.
pub fn file_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn list(State(state): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    let prefix = params.get("prefix").cloned();
    state.listed.lock().unwrap().push(prefix.clone());

    let key = prefix.unwrap_or_default();
    let tree = state.tree.lock().unwrap();
    if tree.failing.contains(&key) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let body: Vec<_> = tree
        .listings
        .get(&key)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|name| {
            if name.ends_with('/') {
                json!({ "name": name })
            } else {
                json!({ "name": name, "url": format!("{}/files/{name}", state.base) })
            }
        })
        .collect();
    axum::Json(body).into_response()
}

async fn download(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    *state.downloads.lock().unwrap().entry(name.clone()).or_default() += 1;

    let tree = state.tree.lock().unwrap();
    let Some(content) = tree.files.get(&name).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if tree.truncated.contains(&name) {
        let half = Bytes::from(content[..content.len() / 2].to_vec());
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(half),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection dropped",
            )),
        ];
        return Body::from_stream(futures::stream::iter(chunks)).into_response();
    }

    content.into_response()
}

async fn probe() -> &'static str {
    "ok"
}

impl TestServer {
    /// Binds an ephemeral port and serves the tree built by `build`.
    pub async fn start(build: impl FnOnce(&mut RemoteTree)) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut tree = RemoteTree::default();
        build(&mut tree);

        let state = Arc::new(ServerState {
            base: format!("http://{addr}"),
            tree: Mutex::new(tree),
            listed: Mutex::new(Vec::new()),
            downloads: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/api/files", get(list))
            .route("/files/{*name}", get(download))
            .route("/probe", get(probe))
            .with_state(Arc::clone(&state));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state }
    }

    pub fn api_url(&self) -> String {
        self.url("/api/files")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.state.base)
    }

    pub fn update(&self, change: impl FnOnce(&mut RemoteTree)) {
        change(&mut self.state.tree.lock().unwrap());
    }

    /// Prefix parameters received by the listing endpoint, in order.
    pub fn listed_prefixes(&self) -> Vec<Option<String>> {
        self.state.listed.lock().unwrap().clone()
    }

    pub fn download_count(&self, name: &str) -> usize {
        self.state
            .downloads
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_downloads(&self) -> usize {
        self.state.downloads.lock().unwrap().values().sum()
    }
}

/// In-memory [`Remote`] recording every listing and download.
#[derive(Default)]
pub struct MockRemote {
    listings: HashMap<String, Vec<Entry>>,
    failing: HashSet<String>,
    failing_downloads: HashSet<String>,
    offline: bool,
    gate: Option<Arc<Semaphore>>,
    listed: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(mut self, prefix: &str, entries: Vec<Entry>) -> Self {
        self.listings.insert(prefix.to_string(), entries);
        self
    }

    pub fn fail_listing(mut self, prefix: &str) -> Self {
        self.failing.insert(prefix.to_string());
        self
    }

    pub fn fail_download(mut self, url: &str) -> Self {
        self.failing_downloads.insert(url.to_string());
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Every listing waits for a permit from `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Remote for MockRemote {
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.listed.lock().unwrap().push(prefix.to_string());
        if self.failing.contains(prefix) {
            return Err(Error::Status {
                url: prefix.to_string(),
                status: 503,
            });
        }
        Ok(self.listings.get(prefix).cloned().unwrap_or_default())
    }

    async fn download(&self, url: &str, dest: &std::path::Path) -> Result<u64> {
        self.downloaded.lock().unwrap().push(url.to_string());
        if self.failing_downloads.contains(url) {
            return Err(Error::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, url.as_bytes())?;
        Ok(url.len() as u64)
    }

    async fn is_online(&self) -> bool {
        !self.offline
    }
}

/// [`SyncProgress`] that keeps everything it is told.
#[derive(Default)]
pub struct RecordingProgress {
    statuses: Mutex<Vec<SyncStatus>>,
    failed: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn statuses(&self) -> Vec<SyncStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn failed_files(&self) -> Vec<String> {
        self.failed.lock().unwrap().clone()
    }
}

impl SyncProgress for RecordingProgress {
    fn on_status(&self, status: &SyncStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }

    fn on_file_error(&self, name: &str, _error: &str) {
        self.failed.lock().unwrap().push(name.to_string());
    }
}
