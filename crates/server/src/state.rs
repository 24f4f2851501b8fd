//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::events::{EventSink, TracingEventSink};
use crate::storage::AttachmentStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    attachments: AttachmentStore,
    events: Arc<dyn EventSink>,
}

impl AppState {
    /// Create application state with the default (logging) event sink.
    #[must_use]
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Self {
        Self::with_event_sink(config, pool, Arc::new(TracingEventSink))
    }

    /// Create application state with a custom event sink (the notification
    /// extension point).
    #[must_use]
    pub fn with_event_sink(
        config: ServerConfig,
        pool: SqlitePool,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let attachments = AttachmentStore::new(config.upload_dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                attachments,
                events,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the attachment store.
    #[must_use]
    pub fn attachments(&self) -> &AttachmentStore {
        &self.inner.attachments
    }

    /// Get a reference to the event sink.
    #[must_use]
    pub fn events(&self) -> &dyn EventSink {
        self.inner.events.as_ref()
    }
}
