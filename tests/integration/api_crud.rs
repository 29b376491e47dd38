//! End-to-end CRUD coverage for the task API.

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{client, spawn_app, task_payload};

#[tokio::test]
async fn health_answers_ok() {
    let app = spawn_app().await;
    let res = client()
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_answers_201_with_defaults_applied() {
    let app = spawn_app().await;
    let res = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&json!({
            "title": "  Pay bill  ",
            "tags": [" home ", "money"]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let task: Value = res.json().await.unwrap();
    assert_eq!(task["title"], "Pay bill");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["reminder_sent"], false);
    assert_eq!(task["tags"], json!(["home", "money"]));
    assert_eq!(task["owner_id"], "default");
    assert!(task["id"].as_str().unwrap().starts_with("task-"));
    assert!(task["created_at"].as_str().is_some());
}

#[tokio::test]
async fn create_with_blank_title_fails_without_persisting() {
    let app = spawn_app().await;
    let res = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&task_payload("   "))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("title"));

    let listed: Vec<Value> = client()
        .get(format!("{}/api/tasks", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn create_with_missing_title_fails() {
    let app = spawn_app().await;
    let res = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&json!({ "description": "no title here" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn get_round_trips_a_created_task() {
    let app = spawn_app().await;
    let created: Value = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&task_payload("fetch me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let res = client()
        .get(format!("{}/api/tasks/{id}", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["title"], "fetch me");
    assert_eq!(fetched["id"].as_str().unwrap(), id);
}

#[tokio::test]
async fn get_unknown_id_answers_404() {
    let app = spawn_app().await;
    let res = client()
        .get(format!("{}/api/tasks/task-missing", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn update_applies_only_supplied_fields() {
    let app = spawn_app().await;
    let created: Value = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&json!({ "title": "stable", "description": "keep" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let res = client()
        .put(format!("{}/api/tasks/{id}", app.base_url))
        .json(&json!({ "status": "done", "priority": "high" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "stable");
    assert_eq!(updated["description"], "keep");
    assert_eq!(updated["status"], "done");
    assert_eq!(updated["priority"], "high");
}

#[tokio::test]
async fn update_with_reminder_at_resets_sent_flag() {
    let app = spawn_app().await;
    let created: Value = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&json!({
            "title": "remind me",
            "reminder_at": (Utc::now() - Duration::minutes(5)).to_rfc3339()
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    // Only the dispatch loop flips this flag; simulate a completed dispatch.
    app.store.mark_reminder_sent(id).unwrap();
    assert!(app.store.find_by_id(&app.owner, id).unwrap().reminder_sent);

    let updated: Value = client()
        .put(format!("{}/api/tasks/{id}", app.base_url))
        .json(&json!({
            "reminder_at": (Utc::now() + Duration::hours(1)).to_rfc3339()
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["reminder_sent"], false);

    // Supplying an explicit null also rearms.
    app.store.mark_reminder_sent(id).unwrap();
    let cleared: Value = client()
        .put(format!("{}/api/tasks/{id}", app.base_url))
        .json(&json!({ "reminder_at": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["reminder_sent"], false);
    assert!(cleared["reminder_at"].is_null());
}

#[tokio::test]
async fn update_unknown_id_answers_404() {
    let app = spawn_app().await;
    let res = client()
        .put(format!("{}/api/tasks/task-missing", app.base_url))
        .json(&json!({ "status": "done" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_everything_404s() {
    let app = spawn_app().await;
    let created: Value = client()
        .post(format!("{}/api/tasks", app.base_url))
        .json(&task_payload("short lived"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let res = client()
        .delete(format!("{}/api/tasks/{id}", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "task deleted");

    let res = client()
        .get(format!("{}/api/tasks/{id}", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client()
        .delete(format!("{}/api/tasks/{id}", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
