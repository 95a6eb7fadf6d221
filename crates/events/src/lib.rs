//! Notification pipeline for workflow side effects.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`NotificationEvent`]: one notification addressed to users or roles.
//! - [`NotificationEmitter`]: fire-and-forget facade used by handlers after a
//!   successful transition.
//! - [`NotificationWriter`]: background service that resolves recipients and
//!   writes rows to the `notifications` table.

pub mod bus;
pub mod emitter;
pub mod writer;

pub use bus::{EventBus, NotificationEvent, Recipient};
pub use emitter::NotificationEmitter;
pub use writer::NotificationWriter;
