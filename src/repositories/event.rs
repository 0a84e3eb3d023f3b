//! EventRepository - Persistence of events

use super::{Create, Read, Update};
use crate::dtos::{CreateEventDTO, UpdateEventDTO};
use crate::entities::{Event, EventStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

pub(crate) const EVENT_COLUMNS: &str = "event_id, creator_id, name, description, venue, starts_at, ends_at, \
     capacity, attendee_count, status, flyer_url, created_at, updated_at";

pub struct EventRepository {
    connection_pool: SqlitePool,
}

impl EventRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Events created by `creator_id`, soonest first
    pub async fn find_many_by_creator(&self, creator_id: &i64) -> Result<Vec<Event>, Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE creator_id = ? ORDER BY starts_at ASC, event_id ASC"
        ))
        .bind(creator_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Create<Event, CreateEventDTO> for EventRepository {
    async fn create(&self, data: &CreateEventDTO) -> Result<Event, Error> {
        let now = Utc::now();
        let status = EventStatus::Draft;

        let result = sqlx::query(
            r#"
            INSERT INTO events (creator_id, name, description, venue, starts_at, ends_at, capacity,
                                attendee_count, status, flyer_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, NULL, ?, ?)
            "#,
        )
        .bind(data.creator_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.venue)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .bind(data.capacity)
        .bind(status)
        .bind(now)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(Event {
            event_id: result.last_insert_rowid(),
            creator_id: data.creator_id,
            name: data.name.clone(),
            description: data.description.clone(),
            venue: data.venue.clone(),
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            capacity: data.capacity,
            attendee_count: 0,
            status,
            flyer_url: None,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Read<Event, i64> for EventRepository {
    async fn read(&self, id: &i64) -> Result<Option<Event>, Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?"))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Event, UpdateEventDTO, i64> for EventRepository {
    async fn update(&self, id: &i64, data: &UpdateEventDTO) -> Result<Event, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;

        let mut query_builder = sqlx::QueryBuilder::new("UPDATE events SET ");
        let mut separated = query_builder.separated(", ");
        let mut changed = false;

        if let Some(ref name) = data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
            changed = true;
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
            changed = true;
        }
        if let Some(ref venue) = data.venue {
            separated.push("venue = ");
            separated.push_bind_unseparated(venue);
            changed = true;
        }
        if let Some(starts_at) = data.starts_at {
            separated.push("starts_at = ");
            separated.push_bind_unseparated(starts_at);
            changed = true;
        }
        if let Some(ends_at) = data.ends_at {
            separated.push("ends_at = ");
            separated.push_bind_unseparated(ends_at);
            changed = true;
        }
        if let Some(capacity) = data.capacity {
            separated.push("capacity = ");
            separated.push_bind_unseparated(capacity);
            changed = true;
        }
        if let Some(status) = data.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status);
            changed = true;
        }
        if let Some(ref flyer_url) = data.flyer_url {
            separated.push("flyer_url = ");
            separated.push_bind_unseparated(flyer_url);
            changed = true;
        }

        if !changed {
            return Ok(current);
        }

        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());

        query_builder.push(" WHERE event_id = ");
        query_builder.push_bind(id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}
