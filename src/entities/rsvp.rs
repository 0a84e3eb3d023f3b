//! Rsvp entities - A submission and its ordered guests

use super::enums::{Gender, RsvpStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Rsvp {
    pub rsvp_id: i64,
    pub event_id: i64,
    pub created_by: i64,
    pub status: RsvpStatus,
    pub added_by_host: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RsvpGuest {
    pub guest_id: i64,
    pub rsvp_id: i64,
    pub position: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Gender,
    pub is_primary: bool,
}
