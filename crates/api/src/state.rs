use std::sync::Arc;

use mimaropa_events::{EventBus, NotificationEmitter};

use crate::attachments::AttachmentStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mimaropa_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus feeding the notification writer.
    pub event_bus: Arc<EventBus>,
    /// Best-effort notification facade over `event_bus`.
    pub notifier: NotificationEmitter,
    /// Local-disk storage for uploaded files.
    pub attachments: AttachmentStore,
}

impl AppState {
    pub fn new(pool: mimaropa_db::DbPool, config: ServerConfig, event_bus: Arc<EventBus>) -> Self {
        let attachments = AttachmentStore::new(&config.uploads_dir, config.max_upload_bytes);
        Self {
            pool,
            notifier: NotificationEmitter::new(Arc::clone(&event_bus)),
            config: Arc::new(config),
            event_bus,
            attachments,
        }
    }
}
