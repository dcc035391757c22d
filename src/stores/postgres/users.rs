use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{self, ErrorExt};
use crate::schema::{InsertUser, User};
use crate::stores::UserStore;

/// [`UserStore`] backed by the Postgres `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    db: database::Database,
}

impl PgUserStore {
    #[must_use]
    pub fn new(db: database::Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(skip(self), name = "db.query.users.find_by_id")]
    async fn find_by_id(&self, id: Uuid) -> database::Result<Option<User>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.query.users.find_all")]
    async fn find_all(&self) -> database::Result<Vec<User>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, User>(r#"SELECT * FROM users ORDER BY created_at"#)
            .fetch_all(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.query.users.find_by_username")]
    async fn find_by_username(&self, fragment: &str) -> database::Result<Vec<User>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE username LIKE '%' || $1 || '%' ORDER BY created_at"#,
        )
        .bind(fragment)
        .fetch_all(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.query.users.insert")]
    async fn insert(&self, user: InsertUser) -> database::Result<User> {
        let mut conn = self.db.write().await?;
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users
                (username, password, firstname, lastname, has_image, image_url,
                 created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(user.has_image)
        .bind(&user.image_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.query.users.save")]
    async fn save(&self, user: &User) -> database::Result<bool> {
        let mut conn = self.db.write().await?;
        let result = sqlx::query(
            r#"UPDATE users
               SET role = $2, username = $3, password = $4, firstname = $5,
                   lastname = $6, has_image = $7, image_url = $8, updated_at = $9,
                   last_active_at = $10, version = version + 1
               WHERE id = $1 AND version = $11"#,
        )
        .bind(user.id)
        .bind(user.role)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(user.has_image)
        .bind(&user.image_url)
        .bind(user.updated_at)
        .bind(user.last_active_at)
        .bind(user.version)
        .execute(&mut *conn)
        .await
        .into_db_error()?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), name = "db.query.users.delete_by_id")]
    async fn delete_by_id(&self, id: Uuid) -> database::Result<u64> {
        let mut conn = self.db.write().await?;
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;

        Ok(result.rows_affected())
    }
}
