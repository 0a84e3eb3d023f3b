//! Event entity

use super::enums::EventStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub event_id: i64,
    pub creator_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
    // sum of the guests of all confirmed rsvps
    pub attendee_count: i64,
    pub status: EventStatus,
    pub flyer_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_published(&self) -> bool {
        self.status == EventStatus::Published
    }

    /// Seats still available, `None` when the event has no capacity limit
    pub fn remaining_capacity(&self) -> Option<i64> {
        self.capacity.map(|c| (c - self.attendee_count).max(0))
    }
}
