//! DTOs module - Data Transfer Objects
//!
//! DTOs keep the API representation apart from the entities stored in the database.

pub mod auth;
pub mod event;
pub mod friend;
pub mod guest;
pub mod notification;
pub mod query;
pub mod rsvp;
pub mod user;
pub mod ws_event;

// Re-exports
pub use auth::{OtpRequestDTO, OtpVerifyDTO};
pub use event::{CreateEventDTO, CreateEventRequestDTO, EventDTO, UpdateEventDTO};
pub use friend::{AddFriendDTO, CreateFriendDTO, FriendDTO};
pub use guest::{GenderTotalsDTO, RosterDTO, RosterEntryDTO};
pub use notification::{CreateNotificationDTO, NotificationDTO, ReadAllDTO};
pub use query::NotificationsQuery;
pub use rsvp::{CreateRsvpDTO, GuestDTO, GuestInput, NewGuestDTO, RsvpDTO, SubmitRsvpDTO};
pub use user::{CreateUserDTO, UpdateUserDTO, UserDTO};
pub use ws_event::WsEventDTO;
