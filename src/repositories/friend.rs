//! FriendRepository - Persistence of cached contacts

use super::{Create, Delete, Read};
use crate::dtos::CreateFriendDTO;
use crate::entities::Friend;
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const FRIEND_COLUMNS: &str = "friend_id, owner_id, name, phone, email, linked_user_id, created_at";

pub struct FriendRepository {
    connection_pool: SqlitePool,
}

impl FriendRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Contacts cached by `owner_id`, newest first
    pub async fn find_many_by_owner(&self, owner_id: &i64) -> Result<Vec<Friend>, Error> {
        sqlx::query_as::<_, Friend>(&format!(
            "SELECT {FRIEND_COLUMNS} FROM friends WHERE owner_id = ? ORDER BY friend_id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Links every not yet linked placeholder matching the phone or the email
    /// to `user_id`, returns how many were linked
    pub async fn link_placeholders(
        &self,
        user_id: &i64,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<u64, Error> {
        if phone.is_none() && email.is_none() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE friends SET linked_user_id = ?
            WHERE linked_user_id IS NULL
              AND ((? IS NOT NULL AND phone = ?) OR (? IS NOT NULL AND email = ?))
            "#,
        )
        .bind(user_id)
        .bind(phone)
        .bind(phone)
        .bind(email)
        .bind(email)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected())
    }
}

impl Create<Friend, CreateFriendDTO> for FriendRepository {
    async fn create(&self, data: &CreateFriendDTO) -> Result<Friend, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO friends (owner_id, name, phone, email, linked_user_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.owner_id)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.email)
        .bind(data.linked_user_id)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(Friend {
            friend_id: result.last_insert_rowid(),
            owner_id: data.owner_id,
            name: data.name.clone(),
            phone: data.phone.clone(),
            email: data.email.clone(),
            linked_user_id: data.linked_user_id,
            created_at: now,
        })
    }
}

impl Read<Friend, i64> for FriendRepository {
    async fn read(&self, id: &i64) -> Result<Option<Friend>, Error> {
        sqlx::query_as::<_, Friend>(&format!("SELECT {FRIEND_COLUMNS} FROM friends WHERE friend_id = ?"))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i64> for FriendRepository {
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM friends WHERE friend_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friends")))]
    async fn test_link_placeholders_by_phone_or_email(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = FriendRepository::new(pool.clone());

        // Dave signs up with another phone but the cached email
        sqlx::query(
            "INSERT INTO users (user_id, name, phone, email, created_at, updated_at) VALUES (4, 'Dave', '9444444444', 'dave@gmail.com', '2026-03-01T10:00:00Z', '2026-03-01T10:00:00Z')",
        )
        .execute(&pool)
        .await?;

        let linked = repo
            .link_placeholders(&4, Some("9444444444"), Some("dave@gmail.com"))
            .await?;
        assert_eq!(linked, 1);

        let dave = repo.read(&1).await?.expect("placeholder exists");
        assert_eq!(dave.linked_user_id, Some(4));

        // already linked rows are left alone
        let linked = repo.link_placeholders(&1, Some("9000000003"), None).await?;
        assert_eq!(linked, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friends")))]
    async fn test_friends_are_scoped_by_owner(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = FriendRepository::new(pool);

        let created = repo
            .create(&CreateFriendDTO {
                owner_id: 1,
                name: "Eve".to_string(),
                phone: None,
                email: Some("eve@gmail.com".to_string()),
                linked_user_id: None,
            })
            .await?;

        let alice_friends = repo.find_many_by_owner(&1).await?;
        assert_eq!(alice_friends.len(), 2);
        assert_eq!(alice_friends[0].friend_id, created.friend_id);

        repo.delete(&created.friend_id).await?;
        assert!(repo.read(&created.friend_id).await?.is_none());
        assert_eq!(repo.find_many_by_owner(&2).await?.len(), 1);
        Ok(())
    }
}
