//! Common repository traits
//!
//! Generic CRUD interfaces implemented by the repositories that need them.

/// Inserts a new entity
///
/// `CreateDTO` carries the data without the primary key, the returned entity
/// has the id assigned by the database.
pub trait Create<Entity, CreateDTO> {
    async fn create(&self, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Reads a single entity by primary key
///
/// # Returns
/// * `Ok(None)` - No entity with that id
pub trait Read<Entity, Id> {
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Partial update, only the `Some(_)` fields of `UpdateDTO` are written
///
/// # Returns
/// * `Err(sqlx::Error::RowNotFound)` - No entity with that id
pub trait Update<Entity, UpdateDTO, Id> {
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, sqlx::Error>;
}

/// Deletes an entity, deleting a missing id is not an error
pub trait Delete<Id> {
    async fn delete(&self, id: &Id) -> Result<(), sqlx::Error>;
}
