//! Notification events and the broadcast bus that carries them to the writer.
//!
//! [`EventBus`] is the publish/subscribe hub for [`NotificationEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use mimaropa_core::notification::NotificationKind;
use mimaropa_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// NotificationEvent
// ---------------------------------------------------------------------------

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Recipient {
    /// A single user.
    User(DbId),
    /// Every active user holding the role.
    Role(String),
}

/// A notification to be persisted for one or more recipients.
///
/// Constructed via [`NotificationEvent::new`] and addressed with
/// [`to_user`](NotificationEvent::to_user) / [`to_role`](NotificationEvent::to_role).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub recipients: Vec<Recipient>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<DbId>,
    /// The user whose action caused the notification.
    pub actor_user_id: Option<DbId>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Create an unaddressed event with the kind's default title.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            message: message.into(),
            recipients: Vec::new(),
            related_entity_type: Some(kind.related_entity_type().to_string()),
            related_entity_id: None,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn to_user(mut self, user_id: DbId) -> Self {
        let recipient = Recipient::User(user_id);
        if !self.recipients.contains(&recipient) {
            self.recipients.push(recipient);
        }
        self
    }

    pub fn to_role(mut self, role: impl Into<String>) -> Self {
        self.recipients.push(Recipient::Role(role.into()));
        self
    }

    /// Point the notification at the entity it is about.
    pub fn about(mut self, entity_id: DbId) -> Self {
        self.related_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Events buffered before a slow writer starts lagging.
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast channel shared by the handlers and the notification writer.
///
/// Capacity bounds the backlog. A receiver that falls further behind than
/// that sees `RecvError::Lagged` and loses the overwritten events.
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _initial_rx) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fire and forget. With nobody subscribed the event is discarded, which
    /// only happens in tests and during shutdown.
    pub fn publish(&self, event: NotificationEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Notification event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
