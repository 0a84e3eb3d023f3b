//! Application State - Shared state of the application
//!
//! Holds the repositories, the configuration and the in-memory structures
//! shared by every route and middleware.

use crate::core::config::Config;
use crate::core::locks::EventLocks;
use crate::core::otp::OtpStore;
use crate::notify::Notifier;
use crate::repositories::{
    EventRepository, FriendRepository, NotificationRepository, RsvpRepository, UserRepository,
};
use crate::storage::FlyerStore;
use crate::ws::usermap::UserMap;
use sqlx::SqlitePool;

pub struct AppState {
    /// Repository of user profiles
    pub user: UserRepository,

    /// Repository of cached contacts
    pub friend: FriendRepository,

    pub event: EventRepository,

    /// Repository of rsvps and their guests
    pub rsvp: RsvpRepository,

    pub notification: NotificationRepository,

    /// Secret key for JWT tokens
    pub jwt_secret: String,

    pub config: Config,

    /// Pending sign-in codes
    pub otp: OtpStore,

    /// Per event locks held across the duplicate checks and the write of an rsvp
    pub event_locks: EventLocks,

    /// Online users and the channel feeding their WebSocket
    pub users_online: UserMap,

    /// Email and WhatsApp senders
    pub notifier: Notifier,

    pub flyers: FlyerStore,
}

impl AppState {
    /// Builds the state, every repository shares the given pool
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            friend: FriendRepository::new(pool.clone()),
            event: EventRepository::new(pool.clone()),
            rsvp: RsvpRepository::new(pool.clone()),
            notification: NotificationRepository::new(pool),
            jwt_secret: config.jwt_secret.clone(),
            otp: OtpStore::new(config.otp_ttl),
            event_locks: EventLocks::new(),
            users_online: UserMap::new(),
            notifier: Notifier::new(config.email.clone(), config.whatsapp.clone()),
            flyers: FlyerStore::new(
                config.flyer_primary.clone(),
                config.flyer_fallback.clone(),
                config.flyer_timeout,
            ),
            config,
        }
    }
}
