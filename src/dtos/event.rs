//! Event DTOs - Data Transfer Objects for events

use crate::entities::{Event, EventStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventDTO {
    pub event_id: i64,
    pub creator_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
    pub attendee_count: i64,
    pub remaining_capacity: Option<i64>,
    pub status: EventStatus,
    pub flyer_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventDTO {
    fn from(value: Event) -> Self {
        Self {
            remaining_capacity: value.remaining_capacity(),
            event_id: value.event_id,
            creator_id: value.creator_id,
            name: value.name,
            description: value.description,
            venue: value.venue,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            capacity: value.capacity,
            attendee_count: value.attendee_count,
            status: value.status,
            flyer_url: value.flyer_url,
            updated_at: value.updated_at,
        }
    }
}

fn validate_schedule(starts_at: &DateTime<Utc>, ends_at: &Option<DateTime<Utc>>) -> Result<(), ValidationError> {
    match ends_at {
        Some(end) if end < starts_at => {
            let mut err = ValidationError::new("schedule");
            err.message = Some("Event can not end before it starts".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Request body to create an event
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_create_schedule"))]
pub struct CreateEventRequestDTO {
    #[validate(length(min = 1, max = 200, message = "Event name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description can not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Venue can not exceed 200 characters"))]
    pub venue: Option<String>,

    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i64>,
}

fn validate_create_schedule(dto: &CreateEventRequestDTO) -> Result<(), ValidationError> {
    validate_schedule(&dto.starts_at, &dto.ends_at)
}

/// DTO to store a new event (without event_id), always created as a draft
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEventDTO {
    pub creator_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
}

impl CreateEventDTO {
    pub fn from_request(creator_id: i64, body: CreateEventRequestDTO) -> Self {
        Self {
            creator_id,
            name: body.name.trim().to_string(),
            description: body.description,
            venue: body.venue,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
            capacity: body.capacity,
        }
    }
}

/// DTO to update an event, only `Some` fields are written
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateEventDTO {
    #[validate(length(min = 1, max = 200, message = "Event name must be between 1 and 200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description can not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Venue can not exceed 200 characters"))]
    pub venue: Option<String>,

    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i64>,

    #[serde(skip)]
    pub status: Option<EventStatus>,

    #[serde(skip)]
    pub flyer_url: Option<String>,
}

impl UpdateEventDTO {
    /// Checks the schedule the event would have once the update is applied
    pub fn validate_against(&self, current: &Event) -> Result<(), ValidationError> {
        let starts_at = self.starts_at.unwrap_or(current.starts_at);
        let ends_at = self.ends_at.or(current.ends_at);
        validate_schedule(&starts_at, &ends_at)
    }
}
