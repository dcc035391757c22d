use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{self, ErrorExt};
use crate::schema::{Email, InsertEmail};
use crate::stores::EmailStore;

/// [`EmailStore`] backed by the Postgres `emails` table.
#[derive(Debug, Clone)]
pub struct PgEmailStore {
    db: database::Database,
}

impl PgEmailStore {
    #[must_use]
    pub fn new(db: database::Database) -> Self {
        Self { db }
    }
}

/// Compare-and-swap update of one row. Shared between the single and
/// batch save paths, which differ only in what the connection is.
async fn update_row(
    conn: &mut database::Connection,
    email: &Email,
) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE emails
           SET email = $2, verified = $3, primary_email = $4, verification_token = $5,
               verification_expires_at = $6, updated_at = $7, version = version + 1
           WHERE id = $1 AND version = $8"#,
    )
    .bind(email.id)
    .bind(&email.email)
    .bind(email.verified)
    .bind(email.primary)
    .bind(&email.verification_token)
    .bind(email.verification_expires_at)
    .bind(email.updated_at)
    .bind(email.version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

#[async_trait]
impl EmailStore for PgEmailStore {
    #[tracing::instrument(skip(self), name = "db.query.emails.find_by_owner")]
    async fn find_by_owner(&self, user_id: Uuid) -> database::Result<Vec<Email>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, Email>(
            r#"SELECT * FROM emails WHERE user_id = $1 ORDER BY created_at"#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.query.emails.find_by_owner_and_id")]
    async fn find_by_owner_and_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> database::Result<Option<Email>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, Email>(r#"SELECT * FROM emails WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.query.emails.insert")]
    async fn insert(&self, email: InsertEmail) -> database::Result<Email> {
        let mut conn = self.db.write().await?;
        sqlx::query_as::<_, Email>(
            r#"INSERT INTO emails (user_id, email, created_at, updated_at)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(email.user_id)
        .bind(&email.email)
        .bind(email.created_at)
        .bind(email.updated_at)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.query.emails.save")]
    async fn save(&self, email: &Email) -> database::Result<bool> {
        let mut conn = self.db.write().await?;
        let rows = update_row(&mut conn, email).await.into_db_error()?;
        Ok(rows == 1)
    }

    #[tracing::instrument(skip_all, name = "db.query.emails.save_all")]
    async fn save_all(&self, emails: &[Email]) -> database::Result<bool> {
        let mut tx = self.db.begin().await?;
        for email in emails {
            let rows = update_row(&mut tx, email).await.into_db_error()?;
            if rows != 1 {
                tx.rollback().await.into_db_error()?;
                return Ok(false);
            }
        }

        tx.commit().await.into_db_error()?;
        Ok(true)
    }

    #[tracing::instrument(skip(self), name = "db.query.emails.delete_by_owner_and_id")]
    async fn delete_by_owner_and_id(&self, user_id: Uuid, id: Uuid) -> database::Result<u64> {
        let mut conn = self.db.write().await?;
        let result = sqlx::query(r#"DELETE FROM emails WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;

        Ok(result.rows_affected())
    }
}
