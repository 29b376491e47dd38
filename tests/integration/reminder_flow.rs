//! The reminder lifecycle end-to-end: create over HTTP, dispatch, verify.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use taskwarden::config::ReminderConfig;
use taskwarden::reminder::{NotificationChannel, ReminderDispatcher};

use crate::helpers::{client, spawn_app};

struct RecordingChannel {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, recipient: &str, text: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((recipient.to_owned(), text.to_owned()));
        Ok(())
    }
}

#[tokio::test]
async fn past_reminder_dispatches_exactly_once() {
    let app = spawn_app().await;

    let created: Value = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&json!({
            "title": "Pay bill",
            "reminder_at": (Utc::now() - Duration::seconds(1)).to_rfc3339()
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["reminder_sent"], false);

    let channel = RecordingChannel::new();
    let dispatcher = ReminderDispatcher::new(Arc::clone(&app.store), &ReminderConfig::default())
        .with_channel(Arc::clone(&channel) as _)
        .with_recipients(vec!["+15550001".to_owned(), "+15550002".to_owned()]);

    // A task with a past reminder at creation time is Due on the first scan.
    assert_eq!(dispatcher.scan_once(Utc::now()).await.unwrap(), 1);

    let calls = channel.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, text)| text.contains("Pay bill")));
    assert_eq!(calls[0].0, "+15550001");
    assert_eq!(calls[1].0, "+15550002");

    let fetched: Value = client()
        .get(format!("{}/api/tasks/{id}", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["reminder_sent"], true);

    // No intervening updates: the second scan dispatches nothing.
    assert_eq!(dispatcher.scan_once(Utc::now()).await.unwrap(), 0);
    assert_eq!(channel.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn completing_a_task_disarms_its_reminder() {
    let app = spawn_app().await;

    let created: Value = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&json!({
            "title": "obsolete",
            "reminder_at": (Utc::now() - Duration::seconds(1)).to_rfc3339()
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    client()
        .put(format!("{}/api/tasks/{id}", app.base_url))
        .json(&json!({ "status": "done" }))
        .send()
        .await
        .unwrap();

    let channel = RecordingChannel::new();
    let dispatcher = ReminderDispatcher::new(Arc::clone(&app.store), &ReminderConfig::default())
        .with_channel(Arc::clone(&channel) as _)
        .with_recipients(vec!["+15550001".to_owned()]);

    assert_eq!(dispatcher.scan_once(Utc::now()).await.unwrap(), 0);
    assert!(channel.calls.lock().unwrap().is_empty());
}
