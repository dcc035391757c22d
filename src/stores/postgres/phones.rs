use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{self, ErrorExt};
use crate::schema::{InsertPhone, Phone};
use crate::stores::PhoneStore;

/// [`PhoneStore`] backed by the Postgres `phones` table.
#[derive(Debug, Clone)]
pub struct PgPhoneStore {
    db: database::Database,
}

impl PgPhoneStore {
    #[must_use]
    pub fn new(db: database::Database) -> Self {
        Self { db }
    }
}

async fn update_row(
    conn: &mut database::Connection,
    phone: &Phone,
) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE phones
           SET phone = $2, country_code = $3, verified = $4, primary_phone = $5,
               verification_token = $6, verification_expires_at = $7, updated_at = $8,
               version = version + 1
           WHERE id = $1 AND version = $9"#,
    )
    .bind(phone.id)
    .bind(&phone.phone)
    .bind(&phone.country_code)
    .bind(phone.verified)
    .bind(phone.primary)
    .bind(&phone.verification_token)
    .bind(phone.verification_expires_at)
    .bind(phone.updated_at)
    .bind(phone.version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

#[async_trait]
impl PhoneStore for PgPhoneStore {
    #[tracing::instrument(skip(self), name = "db.query.phones.find_by_owner")]
    async fn find_by_owner(&self, user_id: Uuid) -> database::Result<Vec<Phone>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, Phone>(
            r#"SELECT * FROM phones WHERE user_id = $1 ORDER BY created_at"#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.query.phones.find_by_owner_and_id")]
    async fn find_by_owner_and_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> database::Result<Option<Phone>> {
        let mut conn = self.db.read().await?;
        sqlx::query_as::<_, Phone>(r#"SELECT * FROM phones WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.query.phones.insert")]
    async fn insert(&self, phone: InsertPhone) -> database::Result<Phone> {
        let mut conn = self.db.write().await?;
        sqlx::query_as::<_, Phone>(
            r#"INSERT INTO phones (user_id, phone, country_code, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(phone.user_id)
        .bind(&phone.phone)
        .bind(&phone.country_code)
        .bind(phone.created_at)
        .bind(phone.updated_at)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.query.phones.save")]
    async fn save(&self, phone: &Phone) -> database::Result<bool> {
        let mut conn = self.db.write().await?;
        let rows = update_row(&mut conn, phone).await.into_db_error()?;
        Ok(rows == 1)
    }

    #[tracing::instrument(skip_all, name = "db.query.phones.save_all")]
    async fn save_all(&self, phones: &[Phone]) -> database::Result<bool> {
        let mut tx = self.db.begin().await?;
        for phone in phones {
            let rows = update_row(&mut tx, phone).await.into_db_error()?;
            if rows != 1 {
                tx.rollback().await.into_db_error()?;
                return Ok(false);
            }
        }

        tx.commit().await.into_db_error()?;
        Ok(true)
    }

    #[tracing::instrument(skip(self), name = "db.query.phones.delete_by_owner_and_id")]
    async fn delete_by_owner_and_id(&self, user_id: Uuid, id: Uuid) -> database::Result<u64> {
        let mut conn = self.db.write().await?;
        let result = sqlx::query(r#"DELETE FROM phones WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .into_db_error()?;

        Ok(result.rows_affected())
    }
}
