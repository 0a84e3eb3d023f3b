//! NotificationRepository - Persistence of in-app notifications

use super::Create;
use crate::dtos::CreateNotificationDTO;
use crate::entities::Notification;
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const NOTIFICATION_COLUMNS: &str = "notification_id, recipient_id, kind, message, is_read, created_at";

pub struct NotificationRepository {
    connection_pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Newest first
    pub async fn find_many_by_recipient(
        &self,
        recipient_id: &i64,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, Error> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE recipient_id = ? AND (? = 0 OR is_read = 0) \
             ORDER BY notification_id DESC LIMIT ?"
        ))
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Marks one notification read, `None` when it does not belong to the recipient
    pub async fn mark_read(
        &self,
        notification_id: &i64,
        recipient_id: &i64,
    ) -> Result<Option<Notification>, Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE notification_id = ? AND recipient_id = ?",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .execute(&self.connection_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE notification_id = ?"
        ))
        .bind(notification_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Returns how many notifications flipped to read
    pub async fn mark_all_read(&self, recipient_id: &i64) -> Result<u64, Error> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0")
                .bind(recipient_id)
                .execute(&self.connection_pool)
                .await?;
        Ok(result.rows_affected())
    }
}

impl Create<Notification, CreateNotificationDTO> for NotificationRepository {
    async fn create(&self, data: &CreateNotificationDTO) -> Result<Notification, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO notifications (recipient_id, kind, message, is_read, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(data.recipient_id)
        .bind(data.kind)
        .bind(&data.message)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(Notification {
            notification_id: result.last_insert_rowid(),
            recipient_id: data.recipient_id,
            kind: data.kind,
            message: data.message.clone(),
            is_read: false,
            created_at: now,
        })
    }
}
