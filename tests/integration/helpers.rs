//! Shared fixtures: a real server on an ephemeral port over a temp-dir
//! backed store, driven with reqwest.

use std::sync::Arc;

use taskwarden::api::{AppState, router};
use taskwarden::{OwnerId, TaskStore};
use tempfile::TempDir;

pub struct TestApp {
    pub base_url: String,
    pub store: Arc<TaskStore>,
    pub owner: OwnerId,
    _data_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(TaskStore::open(data_dir.path()).expect("open store"));
    let owner = OwnerId::new("default");
    let state = AppState {
        store: Arc::clone(&store),
        owner: owner.clone(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("serve");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        store,
        owner,
        _data_dir: data_dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Minimal create payload with the given title.
pub fn task_payload(title: &str) -> serde_json::Value {
    serde_json::json!({ "title": title })
}
