//! Guest list DTOs - Host side roster of an event

use crate::entities::{Event, Gender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the roster, a guest joined with the rsvp it belongs to
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RosterEntryDTO {
    pub guest_id: i64,
    pub rsvp_id: i64,
    pub submitted_by: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Gender,
    pub is_primary: bool,
    pub added_by_host: bool,
    pub responded_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GenderTotalsDTO {
    pub male: usize,
    pub female: usize,
    pub other: usize,
    pub unspecified: usize,
}

impl GenderTotalsDTO {
    pub fn count(entries: &[RosterEntryDTO]) -> Self {
        entries.iter().fold(Self::default(), |mut totals, entry| {
            match entry.gender {
                Gender::Male => totals.male += 1,
                Gender::Female => totals.female += 1,
                Gender::Other => totals.other += 1,
                Gender::Unspecified => totals.unspecified += 1,
            }
            totals
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RosterDTO {
    pub event_id: i64,
    pub event_name: String,
    pub capacity: Option<i64>,
    pub total_guests: usize,
    pub by_gender: GenderTotalsDTO,
    pub guests: Vec<RosterEntryDTO>,
}

impl RosterDTO {
    pub fn new(event: &Event, guests: Vec<RosterEntryDTO>) -> Self {
        Self {
            event_id: event.event_id,
            event_name: event.name.clone(),
            capacity: event.capacity,
            total_guests: guests.len(),
            by_gender: GenderTotalsDTO::count(&guests),
            guests,
        }
    }
}
