use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config;
use crate::schema::{Email, InsertEmail};
use crate::stores::{EmailStore, UserStore};
use crate::types::form::EmailForm;
use crate::types::{Error, ErrorKind, Result, ResultExt};

/// Email records of a user: CRUD, verification and the primary flag.
#[derive(Clone)]
pub struct EmailService {
    users: Arc<dyn UserStore>,
    store: Arc<dyn EmailStore>,
    token_ttl: chrono::Duration,
}

impl EmailService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        store: Arc<dyn EmailStore>,
        verification: &config::Verification,
    ) -> Self {
        Self {
            users,
            store,
            token_ttl: super::token_ttl(verification),
        }
    }

    /// Lists every email owned by `user_id`, oldest first.
    pub async fn get_all(&self, user_id: Uuid) -> Result<Vec<Email>> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Failed to retrieve emails due to server error.",
            )?;
        if user.is_none() {
            return Err(Error::not_found("User not found for the provided ID."));
        }

        self.store.find_by_owner(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Failed to retrieve emails due to server error.",
        )
    }

    pub async fn get_by_id(&self, email_id: Uuid, user_id: Uuid) -> Result<Email> {
        self.store
            .find_by_owner_and_id(user_id, email_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Failed to retrieve emails due to server error.",
            )?
            .ok_or_else(|| Error::not_found("Email not found for the provided IDs."))
    }

    pub async fn create(&self, form: &EmailForm, user_id: Uuid) -> Result<Email> {
        let user = self.users.find_by_id(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while creating the email.",
        )?;
        if user.is_none() {
            return Err(Error::not_found("User not found for the provided ID."));
        }

        let now = Utc::now().naive_utc();
        let email = InsertEmail {
            user_id,
            email: form.email.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(email).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while creating the email.",
        )
    }

    /// Overwrites the address unconditionally. A missing value fails the
    /// same way the not-null column would.
    pub async fn update(&self, form: &EmailForm, email_id: Uuid, user_id: Uuid) -> Result<Email> {
        let mut email = self
            .store
            .find_by_owner_and_id(user_id, email_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Error occurred while updating the email.",
            )?
            .ok_or_else(|| Error::not_found("User or email not found for the provided IDs."))?;

        let Some(address) = form.email.clone() else {
            return Err(Error::internal("Error occurred while updating the email."));
        };
        email.email = address;
        email.updated_at = Utc::now().naive_utc();

        let saved = self.store.save(&email).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while updating the email.",
        )?;
        if !saved {
            return Err(Error::conflict(
                "Email was modified concurrently. Retry the request.",
            ));
        }

        Ok(email)
    }

    /// Deleting an email that does not exist (or belongs to somebody
    /// else) is a no-op.
    pub async fn delete(&self, email_id: Uuid, user_id: Uuid) -> Result<()> {
        self.store
            .delete_by_owner_and_id(user_id, email_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Error occurred while deleting the email.",
            )?;
        Ok(())
    }

    /// Mints a verification token, persists it with its expiry and
    /// returns the absolute verification URL for `origin`.
    pub async fn request_verification(
        &self,
        email_id: Uuid,
        user_id: Uuid,
        origin: &str,
    ) -> Result<String> {
        let mut email = self
            .store
            .find_by_owner_and_id(user_id, email_id)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to send verification email.")?
            .ok_or_else(|| Error::not_found("Email not found for the provided IDs."))?;

        let token = super::mint_token();
        email.verification_token = Some(token.clone());
        email.verification_expires_at = Some(Utc::now().naive_utc() + self.token_ttl);

        let saved = self
            .store
            .save(&email)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to send verification email.")?;
        if !saved {
            return Err(Error::conflict(
                "Email was modified concurrently. Retry the request.",
            ));
        }

        Ok(format!(
            "{origin}/api/user/{user_id}/email/{email_id}/verify?token={token}"
        ))
    }

    /// Marks the email verified when `token` matches the outstanding,
    /// unexpired verification token.
    pub async fn verify_by_id(&self, email_id: Uuid, user_id: Uuid, token: &str) -> Result<Email> {
        let mut email = self
            .store
            .find_by_owner_and_id(user_id, email_id)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to verify email")?
            .ok_or_else(|| Error::not_found("Email not found"))?;

        let Some(expected) = email.verification_token.as_deref() else {
            return Err(Error::bad_request(
                "No verification has been requested for this email.",
            ));
        };
        if expected != token {
            return Err(Error::bad_request("Invalid verification token."));
        }

        let now = Utc::now().naive_utc();
        if email.verification_expires_at.is_some_and(|at| at < now) {
            return Err(Error::bad_request("Verification token has expired."));
        }

        email.verified = true;
        email.verification_token = None;
        email.verification_expires_at = None;
        email.updated_at = now;

        let saved = self
            .store
            .save(&email)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to verify email")?;
        if !saved {
            return Err(Error::conflict(
                "Email was modified concurrently. Retry the request.",
            ));
        }

        Ok(email)
    }

    /// Flips the primary flag so that it is set on exactly the addressed
    /// email and cleared on every other one the user owns. The whole
    /// batch is written atomically.
    pub async fn make_primary(&self, user_id: Uuid, email_id: Uuid) -> Result<()> {
        let mut emails = self.store.find_by_owner(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while setting the email as primary.",
        )?;
        if emails.is_empty() {
            return Err(Error::not_found("Email not found for the provided IDs."));
        }

        for email in &mut emails {
            email.primary = email.id == email_id;
        }

        let saved = self.store.save_all(&emails).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while setting the email as primary.",
        )?;
        if !saved {
            return Err(Error::conflict(
                "Email was modified concurrently. Retry the request.",
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}
