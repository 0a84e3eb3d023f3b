//! Repositories module - One repository per entity
//!
//! Queries are written with the runtime `sqlx::query_as::<_, T>` API and bound
//! parameters; rows are mapped through `sqlx::FromRow` on the entities.
//! Methods returning one row use `fetch_optional`, lists use `fetch_all`,
//! writes use `execute` and read back what they need.

pub mod event;
pub mod friend;
pub mod notification;
pub mod rsvp;
pub mod traits;
pub mod user;

pub use traits::{Create, Delete, Read, Update};

pub use event::EventRepository;
pub use friend::FriendRepository;
pub use notification::NotificationRepository;
pub use rsvp::{RsvpRepository, RsvpWrite};
pub use user::UserRepository;
