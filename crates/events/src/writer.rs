//! Notification persistence service.
//!
//! [`NotificationWriter`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes one `notifications` row per resolved recipient. Failures are
//! logged and dropped; there is no retry. It shuts down when the bus sender
//! is dropped.

use mimaropa_core::types::DbId;
use mimaropa_db::models::notification::CreateNotification;
use mimaropa_db::models::user::User;
use mimaropa_db::repositories::{NotificationRepo, UserRepo};
use mimaropa_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::{NotificationEvent, Recipient};

/// Turns bus events into `notifications` rows.
pub struct NotificationWriter;

impl NotificationWriter {
    /// Consume events until every sender is dropped.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<NotificationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => match Self::persist(&pool, &event).await {
                    Ok(ids) => {
                        tracing::debug!(
                            kind = %event.kind,
                            written = ids.len(),
                            "Notification stored"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            kind = %event.kind,
                            entity_id = ?event.related_entity_id,
                            "Could not store notification"
                        );
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification writer fell behind; events lost"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed; notification writer stopping");
                    break;
                }
            }
        }
    }

    /// Resolve recipients and insert one row each.
    ///
    /// Inactive or missing users are skipped. Returns the inserted IDs.
    pub async fn persist(pool: &DbPool, event: &NotificationEvent) -> Result<Vec<DbId>, sqlx::Error> {
        let recipients = Self::resolve_recipients(pool, &event.recipients).await?;

        let mut ids = Vec::with_capacity(recipients.len());
        for user in recipients {
            let input = CreateNotification {
                recipient_id: user.id,
                recipient_type: user.role,
                kind: event.kind.as_str().to_string(),
                title: event.title.clone(),
                message: event.message.clone(),
                related_entity_type: event.related_entity_type.clone(),
                related_entity_id: event.related_entity_id,
            };
            ids.push(NotificationRepo::create(pool, &input).await?);
        }
        Ok(ids)
    }

    async fn resolve_recipients(
        pool: &DbPool,
        recipients: &[Recipient],
    ) -> Result<Vec<User>, sqlx::Error> {
        let mut users: Vec<User> = Vec::new();
        for recipient in recipients {
            let found = match recipient {
                Recipient::User(id) => UserRepo::find_by_id(pool, *id)
                    .await?
                    .filter(|u| u.is_active)
                    .into_iter()
                    .collect(),
                Recipient::Role(role) => UserRepo::list_active_by_role(pool, role).await?,
            };
            for user in found {
                if !users.iter().any(|u| u.id == user.id) {
                    users.push(user);
                }
            }
        }
        Ok(users)
    }
}
