//! taskwarden: personal task tracking with reminder dispatch.
//!
//! An axum REST API over a SQLite task store, plus a periodic background
//! dispatcher that finds due reminders and places best-effort voice calls.
//!
//! # Architecture
//!
//! - **store**: SQLite-backed task repository with the compound
//!   `(reminder_at, reminder_sent, owner_id)` index the dispatch scan needs
//! - **api**: task CRUD and canned filter routes (today/overdue/upcoming)
//! - **reminder**: the dispatch loop and its notification channels
//! - **config**: TOML configuration for the server, store, owner, loop
//!   cadence, and voice-call credentials
//!
//! The API and the dispatch loop share one store; the loop only ever flips
//! `reminder_sent`, and an update that supplies `reminder_at` clears it
//! again, so the two write paths stay consistent without coordination
//! beyond last-write-wins at the store.

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod reminder;
pub mod store;

pub use config::AppConfig;
pub use error::{Result, TaskError};
pub use model::{OwnerId, Task};
pub use store::TaskStore;
