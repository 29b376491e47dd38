//! Reminder dispatch loop.
//!
//! Spawns a tokio task that periodically scans the store for due, unsent
//! reminders, fans out best-effort notifications, and marks each reminder
//! dispatched. Ticks are strictly serial: a slow scan defers the next tick
//! instead of overlapping it, so the same reminder is never dispatched
//! twice by concurrent scans.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::ReminderConfig;
use crate::error::Result;
use crate::reminder::channel::{NotificationChannel, deliver_to_all};
use crate::store::TaskStore;

/// Background dispatcher for due reminders.
pub struct ReminderDispatcher {
    store: Arc<TaskStore>,
    channels: Vec<Arc<dyn NotificationChannel>>,
    recipients: Vec<String>,
    tick_interval: Duration,
    scan_timeout: Duration,
}

impl ReminderDispatcher {
    pub fn new(store: Arc<TaskStore>, config: &ReminderConfig) -> Self {
        Self {
            store,
            channels: Vec::new(),
            recipients: Vec::new(),
            tick_interval: Duration::from_secs(config.interval_secs.max(1)),
            scan_timeout: Duration::from_secs(config.scan_timeout_secs.max(1)),
        }
    }

    /// Add a notification channel to the fan-out.
    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Set the recipient addresses notified for every due reminder.
    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Start the background loop.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.tick_interval.as_secs(),
                channels = self.channels.len(),
                recipients = self.recipients.len(),
                "reminder dispatcher started"
            );
            let mut interval = tokio::time::interval(self.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                // The scan is awaited before the next tick fires, and the
                // timeout bounds worst-case tick latency.
                match tokio::time::timeout(self.scan_timeout, self.scan_once(Utc::now())).await {
                    Ok(Ok(0)) => {}
                    Ok(Ok(dispatched)) => info!(dispatched, "reminder scan complete"),
                    Ok(Err(e)) => error!(error = %e, "reminder scan failed"),
                    Err(_) => warn!(
                        timeout_secs = self.scan_timeout.as_secs(),
                        "reminder scan exceeded timeout, deferring to next tick"
                    ),
                }
            }
        })
    }

    /// Execute one scan against the given clock. Returns how many reminders
    /// were dispatched.
    ///
    /// A query-stage failure returns before any mutation, so the next tick
    /// retries the same due set. Per-task and per-recipient failures are
    /// logged and never abort the rest of the scan.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.store.due_reminders(&now)?;
        let mut dispatched = 0;

        for task in due {
            let due_label = task
                .due_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "no due date".to_owned());
            info!(
                priority = task.priority.as_str().to_uppercase(),
                title = %task.title,
                due = %due_label,
                "reminder due"
            );

            let text = format!("Reminder for task: {}", task.title);
            let outcomes = deliver_to_all(&self.channels, &self.recipients, &text).await;
            for outcome in &outcomes {
                if let Err(e) = &outcome.result {
                    warn!(
                        channel = outcome.channel,
                        recipient = %outcome.recipient,
                        error = %e,
                        "reminder delivery failed"
                    );
                }
            }

            // Delivery is best-effort and not retried: the reminder is
            // consumed even when every attempt failed.
            match self.store.mark_reminder_sent(&task.id) {
                Ok(()) => dispatched += 1,
                Err(e) => error!(task = %task.id, error = %e, "cannot mark reminder sent"),
            }
        }

        Ok(dispatched)
    }
}
