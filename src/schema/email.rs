use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `emails` table.
///
/// Verification token columns never leave the server. The token a client
/// holds is only ever handed out inside the verification URL.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Email {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub email: String,
    pub verified: bool,
    #[sqlx(rename = "primary_email")]
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

/// Column values for inserting a new `emails` row. Flags start out
/// false from their column defaults.
#[derive(Debug, Clone)]
pub struct InsertEmail {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn wire_body_hides_owner_and_token_columns() {
        let now = Utc::now().naive_utc();
        let email = Email {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            verified: false,
            primary: true,
            verification_token: Some("tok".to_string()),
            verification_expires_at: Some(now),
            created_at: now,
            updated_at: now,
            version: 1,
        };

        let body = serde_json::to_value(&email).unwrap();
        assert!(body.get("user_id").is_none());
        assert!(body.get("verification_token").is_none());
        assert!(body.get("verification_expires_at").is_none());
        assert!(body.get("version").is_none());
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["primary"], true);
    }
}
