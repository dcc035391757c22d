use serde::{Deserialize, Serialize};

/// Create/update payload for users.
///
/// Every field is optional. Creation passes missing required values down
/// to the storage layer's not-null checks, updates treat an absent or
/// empty value as "leave unchanged".
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserForm {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

/// Create/update payload for email records. Flags like `verified` are
/// derived server side and ignored when clients send them anyway.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EmailForm {
    pub email: Option<String>,
}

/// Create/update payload for phone records.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PhoneForm {
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_payloads() {
        let form: UserForm = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(form.username.as_deref(), Some("alice"));
        assert!(form.firstname.is_none());
        assert!(form.password.is_none());
    }

    #[test]
    fn ignores_client_supplied_flags() {
        let form: EmailForm =
            serde_json::from_str(r#"{"email":"a@example.com","verified":true,"primary":true}"#)
                .unwrap();
        assert_eq!(form.email.as_deref(), Some("a@example.com"));
    }
}
