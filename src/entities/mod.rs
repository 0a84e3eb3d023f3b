//! Entities module - Domain entities
//!
//! Every entity maps one table of the database.

pub mod enums;
pub mod event;
pub mod friend;
pub mod notification;
pub mod rsvp;
pub mod user;

// Re-exports
pub use enums::{EventStatus, Gender, NotificationKind, RsvpStatus};
pub use event::Event;
pub use friend::Friend;
pub use notification::Notification;
pub use rsvp::{Rsvp, RsvpGuest};
pub use user::User;
