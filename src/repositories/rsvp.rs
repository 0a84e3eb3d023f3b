//! RsvpRepository - Persistence of rsvps, their guests and the event attendee counter

use super::Read;
use crate::dtos::{CreateRsvpDTO, RosterEntryDTO};
use crate::entities::{Rsvp, RsvpGuest, RsvpStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const RSVP_COLUMNS: &str = "rsvp_id, event_id, created_by, status, added_by_host, created_at, updated_at";
const GUEST_COLUMNS: &str = "g.guest_id, g.rsvp_id, g.position, g.name, g.email, g.phone, g.gender, g.is_primary";

/// Outcome of an rsvp write
#[derive(Debug)]
pub enum RsvpWrite {
    Stored(Rsvp, Vec<RsvpGuest>),
    /// Nothing was written, the guests do not fit in the remaining capacity
    CapacityExceeded,
}

pub struct RsvpRepository {
    connection_pool: SqlitePool,
}

impl RsvpRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Stores the rsvp, its guests in order and bumps the attendee counter of
    /// the event, all in one transaction. The counter update is guarded by the
    /// capacity so a full event is never overbooked.
    pub async fn create_with_guests(&self, data: &CreateRsvpDTO) -> Result<RsvpWrite, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let guest_count = data.guests.len() as i64;

        let bumped = sqlx::query(
            r#"
            UPDATE events SET attendee_count = attendee_count + ?
            WHERE event_id = ? AND (capacity IS NULL OR attendee_count + ? <= capacity)
            "#,
        )
        .bind(guest_count)
        .bind(data.event_id)
        .bind(guest_count)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RsvpWrite::CapacityExceeded);
        }

        let now = Utc::now();
        let status = RsvpStatus::Confirmed;
        let result = sqlx::query(
            r#"
            INSERT INTO rsvps (event_id, created_by, status, added_by_host, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.event_id)
        .bind(data.created_by)
        .bind(status)
        .bind(data.added_by_host)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let rsvp_id = result.last_insert_rowid();

        let mut guests = Vec::with_capacity(data.guests.len());
        for (position, guest) in data.guests.iter().enumerate() {
            let position = position as i64;
            let inserted = sqlx::query(
                r#"
                INSERT INTO rsvp_guests (rsvp_id, position, name, email, phone, gender, is_primary)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(rsvp_id)
            .bind(position)
            .bind(&guest.name)
            .bind(&guest.email)
            .bind(&guest.phone)
            .bind(guest.gender)
            .bind(guest.is_primary)
            .execute(&mut *tx)
            .await?;

            guests.push(RsvpGuest {
                guest_id: inserted.last_insert_rowid(),
                rsvp_id,
                position,
                name: guest.name.clone(),
                email: guest.email.clone(),
                phone: guest.phone.clone(),
                gender: guest.gender,
                is_primary: guest.is_primary,
            });
        }

        tx.commit().await?;

        let rsvp = Rsvp {
            rsvp_id,
            event_id: data.event_id,
            created_by: data.created_by,
            status,
            added_by_host: data.added_by_host,
            created_at: now,
            updated_at: now,
        };
        Ok(RsvpWrite::Stored(rsvp, guests))
    }

    /// The confirmed rsvp the user submitted for the event, host additions excluded
    pub async fn find_confirmed_by_user(
        &self,
        event_id: &i64,
        user_id: &i64,
    ) -> Result<Option<Rsvp>, Error> {
        sqlx::query_as::<_, Rsvp>(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps \
             WHERE event_id = ? AND created_by = ? AND status = ? AND added_by_host = 0"
        ))
        .bind(event_id)
        .bind(user_id)
        .bind(RsvpStatus::Confirmed)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Guests of an rsvp in submission order
    pub async fn find_guests(&self, rsvp_id: &i64) -> Result<Vec<RsvpGuest>, Error> {
        sqlx::query_as::<_, RsvpGuest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM rsvp_guests g WHERE g.rsvp_id = ? ORDER BY g.position"
        ))
        .bind(rsvp_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Every guest of every confirmed rsvp of the event
    pub async fn find_confirmed_guests_by_event(&self, event_id: &i64) -> Result<Vec<RsvpGuest>, Error> {
        sqlx::query_as::<_, RsvpGuest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM rsvp_guests g \
             JOIN rsvps r ON r.rsvp_id = g.rsvp_id \
             WHERE r.event_id = ? AND r.status = ? \
             ORDER BY r.rsvp_id, g.position"
        ))
        .bind(event_id)
        .bind(RsvpStatus::Confirmed)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Host side guest list, ordered by rsvp then position
    pub async fn roster(&self, event_id: &i64) -> Result<Vec<RosterEntryDTO>, Error> {
        sqlx::query_as::<_, RosterEntryDTO>(
            r#"
            SELECT g.guest_id, g.rsvp_id, r.created_by AS submitted_by, g.name, g.email, g.phone,
                   g.gender, g.is_primary, r.added_by_host, r.created_at AS responded_at
            FROM rsvp_guests g
            JOIN rsvps r ON r.rsvp_id = g.rsvp_id
            WHERE r.event_id = ? AND r.status = ?
            ORDER BY r.rsvp_id, g.position
            "#,
        )
        .bind(event_id)
        .bind(RsvpStatus::Confirmed)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Marks a confirmed rsvp cancelled and gives its seats back to the event.
    /// Returns `false` when the rsvp was not confirmed anymore.
    pub async fn cancel(&self, rsvp: &Rsvp, guest_count: i64) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let cancelled = sqlx::query(
            "UPDATE rsvps SET status = ?, updated_at = ? WHERE rsvp_id = ? AND status = ?",
        )
        .bind(RsvpStatus::Cancelled)
        .bind(Utc::now())
        .bind(rsvp.rsvp_id)
        .bind(RsvpStatus::Confirmed)
        .execute(&mut *tx)
        .await?;

        if cancelled.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE events SET attendee_count = MAX(attendee_count - ?, 0) WHERE event_id = ?",
        )
        .bind(guest_count)
        .bind(rsvp.event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

impl Read<Rsvp, i64> for RsvpRepository {
    async fn read(&self, id: &i64) -> Result<Option<Rsvp>, Error> {
        sqlx::query_as::<_, Rsvp>(&format!("SELECT {RSVP_COLUMNS} FROM rsvps WHERE rsvp_id = ?"))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
