use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `phones` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Phone {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub phone: String,
    pub country_code: String,
    pub verified: bool,
    #[sqlx(rename = "primary_phone")]
    pub primary: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub verification_expires_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing)]
    pub version: i64,
}

/// Column values for inserting a new `phones` row.
#[derive(Debug, Clone)]
pub struct InsertPhone {
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
