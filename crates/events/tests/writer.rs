//! Integration tests for notification persistence.

use std::time::Duration;

use mimaropa_core::notification::NotificationKind;
use mimaropa_db::models::user::{CreateUser, User};
use mimaropa_db::repositories::{NotificationRepo, UserRepo};
use mimaropa_events::{EventBus, NotificationEvent, NotificationWriter};
use sqlx::PgPool;

async fn user(pool: &PgPool, email: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "x".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: role.to_string(),
            province: None,
        },
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn role_recipients_fan_out_once_per_user(pool: PgPool) {
    let dost_a = user(&pool, "a@dost.gov.ph", "dost_mimaropa").await;
    let dost_b = user(&pool, "b@dost.gov.ph", "dost_mimaropa").await;
    user(&pool, "psto@dost.gov.ph", "psto").await;

    let event = NotificationEvent::new(NotificationKind::TnaForwarded, "TNA #1 forwarded")
        .to_role("dost_mimaropa")
        .to_user(dost_a.id)
        .about(1);

    let ids = NotificationWriter::persist(&pool, &event).await.unwrap();
    assert_eq!(ids.len(), 2);

    for recipient in [&dost_a, &dost_b] {
        let rows = NotificationRepo::list_for_user(&pool, recipient.id, false, 10, 0)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "tna_forwarded");
        assert_eq!(rows[0].recipient_type, "dost_mimaropa");
        assert_eq!(rows[0].related_entity_id, Some(1));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_user_is_skipped(pool: PgPool) {
    let event = NotificationEvent::new(NotificationKind::TnaScheduled, "x").to_user(9999);
    let ids = NotificationWriter::persist(&pool, &event).await.unwrap();
    assert!(ids.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn writer_drains_bus_until_closed(pool: PgPool) {
    let proponent = user(&pool, "p@example.com", "proponent").await;

    let bus = EventBus::default();
    let handle = tokio::spawn(NotificationWriter::run(pool.clone(), bus.subscribe()));

    bus.publish(NotificationEvent::new(NotificationKind::TnaScheduled, "Scheduled").to_user(proponent.id));
    drop(bus);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("writer should stop once the bus is dropped")
        .unwrap();

    assert_eq!(NotificationRepo::unread_count(&pool, proponent.id).await.unwrap(), 1);
}
