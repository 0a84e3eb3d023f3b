//! RSVP DTOs - Data Transfer Objects for RSVP submissions

use crate::entities::{Gender, Rsvp, RsvpGuest, RsvpStatus};
use crate::validation::ValidGuest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guest as typed in by the client, nothing normalized yet
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GuestInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Gender,
}

/// Request body of an RSVP, the first guest is the submitter
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmitRsvpDTO {
    pub guests: Vec<GuestInput>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GuestDTO {
    pub guest_id: i64,
    pub position: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Gender,
    pub is_primary: bool,
}

impl From<RsvpGuest> for GuestDTO {
    fn from(value: RsvpGuest) -> Self {
        Self {
            guest_id: value.guest_id,
            position: value.position,
            name: value.name,
            email: value.email,
            phone: value.phone,
            gender: value.gender,
            is_primary: value.is_primary,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RsvpDTO {
    pub rsvp_id: i64,
    pub event_id: i64,
    pub created_by: i64,
    pub status: RsvpStatus,
    pub added_by_host: bool,
    pub created_at: DateTime<Utc>,
    pub guests: Vec<GuestDTO>,
}

impl RsvpDTO {
    pub fn new(rsvp: Rsvp, guests: Vec<RsvpGuest>) -> Self {
        Self {
            rsvp_id: rsvp.rsvp_id,
            event_id: rsvp.event_id,
            created_by: rsvp.created_by,
            status: rsvp.status,
            added_by_host: rsvp.added_by_host,
            created_at: rsvp.created_at,
            guests: guests.into_iter().map(GuestDTO::from).collect(),
        }
    }
}

/// A validated guest ready to be stored
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewGuestDTO {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Gender,
    pub is_primary: bool,
}

impl From<ValidGuest> for NewGuestDTO {
    fn from(value: ValidGuest) -> Self {
        Self {
            name: value.name,
            email: value.contact.email,
            phone: value.contact.phone,
            gender: value.gender,
            is_primary: value.is_primary,
        }
    }
}

/// DTO to store an RSVP with its guests (without ids)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateRsvpDTO {
    pub event_id: i64,
    pub created_by: i64,
    pub added_by_host: bool,
    pub guests: Vec<NewGuestDTO>,
}
