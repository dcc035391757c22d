use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config;
use crate::schema::{InsertPhone, Phone};
use crate::stores::{PhoneStore, UserStore};
use crate::types::form::PhoneForm;
use crate::types::{Error, ErrorKind, Result, ResultExt};

/// Phone records of a user. Mirrors [`EmailService`] with phone numbers
/// carrying a country code next to the number itself.
///
/// [`EmailService`]: super::EmailService
#[derive(Clone)]
pub struct PhoneService {
    users: Arc<dyn UserStore>,
    store: Arc<dyn PhoneStore>,
    token_ttl: chrono::Duration,
}

impl PhoneService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        store: Arc<dyn PhoneStore>,
        verification: &config::Verification,
    ) -> Self {
        Self {
            users,
            store,
            token_ttl: super::token_ttl(verification),
        }
    }

    pub async fn get_all(&self, user_id: Uuid) -> Result<Vec<Phone>> {
        let user = self.users.find_by_id(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Failed to retrieve phones due to server error.",
        )?;
        if user.is_none() {
            return Err(Error::not_found("User not found for the provided ID."));
        }

        self.store.find_by_owner(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Failed to retrieve phones due to server error.",
        )
    }

    pub async fn get_by_id(&self, phone_id: Uuid, user_id: Uuid) -> Result<Phone> {
        self.store
            .find_by_owner_and_id(user_id, phone_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Failed to retrieve phones due to server error.",
            )?
            .ok_or_else(|| Error::not_found("Phone not found for the provided IDs."))
    }

    pub async fn create(&self, form: &PhoneForm, user_id: Uuid) -> Result<Phone> {
        let user = self.users.find_by_id(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while creating the phone.",
        )?;
        if user.is_none() {
            return Err(Error::not_found("User not found for the provided ID."));
        }

        let now = Utc::now().naive_utc();
        let phone = InsertPhone {
            user_id,
            phone: form.phone.clone(),
            country_code: form.country_code.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(phone).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while creating the phone.",
        )
    }

    /// Overwrites number and country code unconditionally, like the
    /// email update overwrites the address.
    pub async fn update(&self, form: &PhoneForm, phone_id: Uuid, user_id: Uuid) -> Result<Phone> {
        let mut phone = self
            .store
            .find_by_owner_and_id(user_id, phone_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Error occurred while updating the phone.",
            )?
            .ok_or_else(|| Error::not_found("User or phone not found for the provided IDs."))?;

        let (Some(number), Some(country_code)) =
            (form.phone.clone(), form.country_code.clone())
        else {
            return Err(Error::internal("Error occurred while updating the phone."));
        };
        phone.phone = number;
        phone.country_code = country_code;
        phone.updated_at = Utc::now().naive_utc();

        let saved = self.store.save(&phone).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while updating the phone.",
        )?;
        if !saved {
            return Err(Error::conflict(
                "Phone was modified concurrently. Retry the request.",
            ));
        }

        Ok(phone)
    }

    pub async fn delete(&self, phone_id: Uuid, user_id: Uuid) -> Result<()> {
        self.store
            .delete_by_owner_and_id(user_id, phone_id)
            .await
            .map_db_err(
                ErrorKind::Internal,
                "Error occurred while deleting the phone.",
            )?;
        Ok(())
    }

    pub async fn request_verification(
        &self,
        phone_id: Uuid,
        user_id: Uuid,
        origin: &str,
    ) -> Result<String> {
        let mut phone = self
            .store
            .find_by_owner_and_id(user_id, phone_id)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to send verification request.")?
            .ok_or_else(|| Error::not_found("Phone not found for the provided IDs."))?;

        let token = super::mint_token();
        phone.verification_token = Some(token.clone());
        phone.verification_expires_at = Some(Utc::now().naive_utc() + self.token_ttl);

        let saved = self
            .store
            .save(&phone)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to send verification request.")?;
        if !saved {
            return Err(Error::conflict(
                "Phone was modified concurrently. Retry the request.",
            ));
        }

        Ok(format!(
            "{origin}/api/user/{user_id}/phone/{phone_id}/verify?token={token}"
        ))
    }

    pub async fn verify_by_id(&self, phone_id: Uuid, user_id: Uuid, token: &str) -> Result<Phone> {
        let mut phone = self
            .store
            .find_by_owner_and_id(user_id, phone_id)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to verify the phone number.")?
            .ok_or_else(|| Error::not_found("Phone number not found"))?;

        let Some(expected) = phone.verification_token.as_deref() else {
            return Err(Error::bad_request(
                "No verification has been requested for this phone.",
            ));
        };
        if expected != token {
            return Err(Error::bad_request("Invalid verification token."));
        }

        let now = Utc::now().naive_utc();
        if phone.verification_expires_at.is_some_and(|at| at < now) {
            return Err(Error::bad_request("Verification token has expired."));
        }

        phone.verified = true;
        phone.verification_token = None;
        phone.verification_expires_at = None;
        phone.updated_at = now;

        let saved = self
            .store
            .save(&phone)
            .await
            .map_db_err(ErrorKind::Internal, "Failed to verify the phone number.")?;
        if !saved {
            return Err(Error::conflict(
                "Phone was modified concurrently. Retry the request.",
            ));
        }

        Ok(phone)
    }

    pub async fn make_primary(&self, user_id: Uuid, phone_id: Uuid) -> Result<()> {
        let mut phones = self.store.find_by_owner(user_id).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while setting the phone as primary.",
        )?;
        if phones.is_empty() {
            return Err(Error::not_found("Phone or user not found."));
        }

        for phone in &mut phones {
            phone.primary = phone.id == phone_id;
        }

        let saved = self.store.save_all(&phones).await.map_db_err(
            ErrorKind::Internal,
            "Error occurred while setting the phone as primary.",
        )?;
        if !saved {
            return Err(Error::conflict(
                "Phone was modified concurrently. Retry the request.",
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for PhoneService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneService")
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InsertUser, User};
    use crate::stores::memory::MemoryStores;

    fn service(stores: &Arc<MemoryStores>) -> PhoneService {
        PhoneService::new(
            stores.clone(),
            stores.clone(),
            &config::Verification::default(),
        )
    }

    async fn seed_user(stores: &Arc<MemoryStores>, username: &str) -> User {
        let now = Utc::now().naive_utc();
        UserStore::insert(
            &**stores,
            InsertUser {
                username: Some(username.to_string()),
                password: Some("secret".to_string()),
                firstname: Some("Test".to_string()),
                lastname: None,
                has_image: false,
                image_url: None,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap()
    }

    fn form(number: &str) -> PhoneForm {
        PhoneForm {
            phone: Some(number.to_string()),
            country_code: Some("+1".to_string()),
        }
    }

    #[tokio::test]
    async fn created_phones_keep_their_country_code() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "alice").await;

        let created = service.create(&form("5550100"), user.id).await.unwrap();
        assert_eq!(created.phone, "5550100");
        assert_eq!(created.country_code, "+1");
        assert!(!created.verified);
        assert!(!created.primary);
    }

    #[tokio::test]
    async fn create_requires_the_country_code() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "bob").await;

        let incomplete = PhoneForm {
            phone: Some("5550101".to_string()),
            country_code: None,
        };
        let error = service.create(&incomplete, user.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.message(), "Error occurred while creating the phone.");
    }

    #[tokio::test]
    async fn lookups_are_scoped_to_the_owner() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let alice = seed_user(&stores, "alice").await;
        let bob = seed_user(&stores, "bob").await;
        let bobs = service.create(&form("5550102"), bob.id).await.unwrap();

        let error = service.get_by_id(bobs.id, alice.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), "Phone not found for the provided IDs.");

        let error = service
            .update(&form("5550199"), bobs.id, alice.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(
            error.message(),
            "User or phone not found for the provided IDs."
        );
    }

    #[tokio::test]
    async fn update_overwrites_number_and_country_code() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "carol").await;
        let created = service.create(&form("5550103"), user.id).await.unwrap();

        let replacement = PhoneForm {
            phone: Some("5550104".to_string()),
            country_code: Some("+63".to_string()),
        };
        let updated = service
            .update(&replacement, created.id, user.id)
            .await
            .unwrap();
        assert_eq!(updated.phone, "5550104");
        assert_eq!(updated.country_code, "+63");

        // both values are required on update
        let missing_code = PhoneForm {
            phone: Some("5550105".to_string()),
            country_code: None,
        };
        let error = service
            .update(&missing_code, created.id, user.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.message(), "Error occurred while updating the phone.");
    }

    #[tokio::test]
    async fn make_primary_flips_exactly_one_flag() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "dave").await;
        let first = service.create(&form("5550106"), user.id).await.unwrap();
        let second = service.create(&form("5550107"), user.id).await.unwrap();

        service.make_primary(user.id, first.id).await.unwrap();
        let listed = service.get_all(user.id).await.unwrap();
        assert!(listed.iter().find(|p| p.id == first.id).unwrap().primary);
        assert!(!listed.iter().find(|p| p.id == second.id).unwrap().primary);
        assert_eq!(listed.iter().filter(|p| p.primary).count(), 1);
    }

    #[tokio::test]
    async fn make_primary_without_any_phone_is_not_found() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "erin").await;

        let error = service
            .make_primary(user.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), "Phone or user not found.");
    }

    #[tokio::test]
    async fn verification_round_trip() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "frank").await;
        let created = service.create(&form("5550108"), user.id).await.unwrap();

        let url = service
            .request_verification(created.id, user.id, "http://localhost:8080")
            .await
            .unwrap();
        assert!(url.starts_with(&format!(
            "http://localhost:8080/api/user/{}/phone/{}/verify?token=",
            user.id, created.id
        )));

        let token = service
            .get_by_id(created.id, user.id)
            .await
            .unwrap()
            .verification_token
            .unwrap();
        let verified = service
            .verify_by_id(created.id, user.id, &token)
            .await
            .unwrap();
        assert!(verified.verified);
        assert!(verified.verification_token.is_none());
    }

    #[tokio::test]
    async fn verify_missing_phone_uses_the_phone_wording() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "grace").await;

        let error = service
            .verify_by_id(Uuid::new_v4(), user.id, "token")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), "Phone number not found");
    }

    #[tokio::test]
    async fn verify_failure_uses_the_phone_wording() {
        let stores = MemoryStores::new();
        let service = service(&stores);
        let user = seed_user(&stores, "henry").await;
        let created = service.create(&form("5550109"), user.id).await.unwrap();

        stores.fail_all(true);
        let error = service
            .verify_by_id(created.id, user.id, "token")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.message(), "Failed to verify the phone number.");
    }
}
