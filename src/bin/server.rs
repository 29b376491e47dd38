//! Task tracker server binary.
//!
//! Loads configuration, opens the task store, starts the reminder
//! dispatcher, and serves the HTTP API until the process exits.

use std::sync::Arc;

use taskwarden::api::{self, AppState};
use taskwarden::reminder::{ReminderDispatcher, VoiceCallChannel};
use taskwarden::{AppConfig, OwnerId, TaskStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskwarden=info")),
        )
        .init();

    let config = AppConfig::load();
    let store_dir = config.store.resolve_dir();
    let store = Arc::new(TaskStore::open(&store_dir).map_err(|e| {
        tracing::error!(dir = %store_dir.display(), error = %e, "cannot open task store");
        anyhow::anyhow!("cannot open task store: {e}")
    })?);

    if config.reminder.enabled {
        let mut dispatcher = ReminderDispatcher::new(Arc::clone(&store), &config.reminder);
        if config.voice.enabled {
            dispatcher = dispatcher
                .with_channel(Arc::new(VoiceCallChannel::new(&config.voice)))
                .with_recipients(config.voice.to_numbers.clone());
        }
        dispatcher.run();
    } else {
        tracing::info!("reminder dispatcher disabled by config");
    }

    let state = AppState {
        store,
        owner: OwnerId::new(&config.owner.id),
    };
    api::serve(&config.server, state).await?;
    Ok(())
}
