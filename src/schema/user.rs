use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `users` table.
///
/// The struct doubles as the wire shape for user bodies, which is why
/// `password` and the bookkeeping `version` column are never serialized.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub firstname: String,
    pub lastname: Option<String>,
    pub has_image: bool,
    pub image_url: Option<String>,
    pub primary_email_id: Option<Uuid>,
    pub primary_phone_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_active_at: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub version: i64,
}

/// Access level of a user. Stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Column values for inserting a new `users` row.
///
/// Required columns stay optional here. A missing value reaches Postgres
/// as NULL and comes back as a not-null violation, which keeps the
/// decision about required fields in one place.
#[derive(Debug, Clone)]
pub struct InsertUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub has_image: bool,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
