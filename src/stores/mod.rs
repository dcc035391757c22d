use async_trait::async_trait;
use uuid::Uuid;

use crate::database;
use crate::schema::{Email, InsertEmail, InsertPhone, InsertUser, Phone, User};

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

/// Storage operations over the `users` table.
///
/// `save` methods are compare-and-swap writes: they only apply when the
/// caller's `version` still matches the stored row, and report whether
/// they did. A `false` result means somebody else won the race.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> database::Result<Option<User>>;
    async fn find_all(&self) -> database::Result<Vec<User>>;
    /// Finds every user whose username contains `fragment`.
    async fn find_by_username(&self, fragment: &str) -> database::Result<Vec<User>>;
    async fn insert(&self, user: InsertUser) -> database::Result<User>;
    async fn save(&self, user: &User) -> database::Result<bool>;
    /// Deletes a user row, cascading to contact records. Returns how
    /// many rows were deleted.
    async fn delete_by_id(&self, id: Uuid) -> database::Result<u64>;
}

/// Storage operations over the `emails` table. Lookups are always
/// scoped to the owning user.
#[async_trait]
pub trait EmailStore: Send + Sync {
    async fn find_by_owner(&self, user_id: Uuid) -> database::Result<Vec<Email>>;
    async fn find_by_owner_and_id(&self, user_id: Uuid, id: Uuid)
        -> database::Result<Option<Email>>;
    async fn insert(&self, email: InsertEmail) -> database::Result<Email>;
    async fn save(&self, email: &Email) -> database::Result<bool>;
    /// Saves the whole batch inside one transaction. Rolls back and
    /// reports `false` when any row was changed concurrently.
    async fn save_all(&self, emails: &[Email]) -> database::Result<bool>;
    async fn delete_by_owner_and_id(&self, user_id: Uuid, id: Uuid) -> database::Result<u64>;
}

/// Storage operations over the `phones` table. Mirrors [`EmailStore`].
#[async_trait]
pub trait PhoneStore: Send + Sync {
    async fn find_by_owner(&self, user_id: Uuid) -> database::Result<Vec<Phone>>;
    async fn find_by_owner_and_id(&self, user_id: Uuid, id: Uuid)
        -> database::Result<Option<Phone>>;
    async fn insert(&self, phone: InsertPhone) -> database::Result<Phone>;
    async fn save(&self, phone: &Phone) -> database::Result<bool>;
    async fn save_all(&self, phones: &[Phone]) -> database::Result<bool>;
    async fn delete_by_owner_and_id(&self, user_id: Uuid, id: Uuid) -> database::Result<u64>;
}
