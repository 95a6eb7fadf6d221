//! Fire-and-forget notification facade.
//!
//! Handlers call [`NotificationEmitter::emit`] after a transition has been
//! committed. Emission never blocks and never fails; persistence happens in
//! the [`NotificationWriter`](crate::writer::NotificationWriter) task.

use std::sync::Arc;

use mimaropa_core::funding::FundingRequestStatus;
use mimaropa_core::notification::NotificationKind;
use mimaropa_core::tna::TnaStatus;
use mimaropa_core::types::DbId;

use crate::bus::{EventBus, NotificationEvent};

/// Publishes notification events onto the shared [`EventBus`].
#[derive(Clone)]
pub struct NotificationEmitter {
    bus: Arc<EventBus>,
}

impl NotificationEmitter {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Publish `event`. Events without recipients are dropped.
    pub fn emit(&self, event: NotificationEvent) {
        if event.recipients.is_empty() {
            tracing::debug!(kind = %event.kind, "Dropping notification without recipients");
            return;
        }
        tracing::debug!(
            kind = %event.kind,
            entity_id = ?event.related_entity_id,
            recipients = event.recipients.len(),
            "Emitting notification"
        );
        self.bus.publish(event);
    }
}

/// Notification kind announcing that a TNA reached `status`.
pub fn tna_kind(status: TnaStatus) -> NotificationKind {
    match status {
        TnaStatus::Scheduled | TnaStatus::Cancelled => NotificationKind::TnaScheduled,
        TnaStatus::InProgress => NotificationKind::TnaInProgress,
        TnaStatus::Completed | TnaStatus::ReportUploaded => NotificationKind::TnaCompleted,
        TnaStatus::ForwardedToDostMimaropa => NotificationKind::TnaForwarded,
        TnaStatus::DostMimaropaApproved
        | TnaStatus::DostMimaropaRejected
        | TnaStatus::ReturnedToPsto => NotificationKind::TnaReviewed,
        TnaStatus::SignedByRd => NotificationKind::TnaSigned,
    }
}

/// Unaddressed event announcing a TNA status change.
pub fn tna_event(tna_id: DbId, program_name: &str, status: TnaStatus) -> NotificationEvent {
    NotificationEvent::new(
        tna_kind(status),
        format!("{program_name} TNA #{tna_id} is now {}", status.label()),
    )
    .about(tna_id)
}

/// Unaddressed event announcing a funding request status change.
pub fn funding_status_event(request_id: DbId, status: FundingRequestStatus) -> NotificationEvent {
    let kind = match status {
        FundingRequestStatus::DocumentsRequested => NotificationKind::DocumentsRequested,
        FundingRequestStatus::DocumentsSubmitted => NotificationKind::DocumentSubmitted,
        _ => NotificationKind::FundingStatusChanged,
    };
    let readable = status.as_str().replace('_', " ");
    NotificationEvent::new(
        kind,
        format!("Funding document request #{request_id} is now {readable}"),
    )
    .about(request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Recipient;

    #[tokio::test]
    async fn emit_publishes_addressed_events() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let emitter = NotificationEmitter::new(Arc::clone(&bus));

        emitter.emit(tna_event(5, "SETUP", TnaStatus::InProgress).to_user(11));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, NotificationKind::TnaInProgress);
        assert_eq!(event.message, "SETUP TNA #5 is now In Progress");
        assert_eq!(event.recipients, vec![Recipient::User(11)]);
    }

    #[tokio::test]
    async fn unaddressed_events_are_dropped() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let emitter = NotificationEmitter::new(Arc::clone(&bus));

        emitter.emit(tna_event(5, "SETUP", TnaStatus::InProgress));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn review_outcomes_share_a_kind() {
        assert_eq!(tna_kind(TnaStatus::ReturnedToPsto), NotificationKind::TnaReviewed);
        assert_eq!(tna_kind(TnaStatus::DostMimaropaApproved), NotificationKind::TnaReviewed);
    }

    #[test]
    fn funding_messages() {
        let event = funding_status_event(3, FundingRequestStatus::DocumentsUnderReview);
        assert_eq!(event.kind, NotificationKind::FundingStatusChanged);
        assert_eq!(event.message, "Funding document request #3 is now documents under review");
        assert_eq!(event.related_entity_type.as_deref(), Some("funding_document_request"));
    }
}
