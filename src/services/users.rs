use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::schema::{InsertUser, User};
use crate::stores::UserStore;
use crate::types::form::UserForm;
use crate::types::{Error, ErrorKind, Result, ResultExt};

/// User CRUD on top of a [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl UserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        self.store
            .find_by_id(id)
            .await
            .map_db_err(ErrorKind::Internal, "Something went wrong")?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        self.store
            .find_all()
            .await
            .map_db_err(ErrorKind::Internal, "Something went wrong")
    }

    pub async fn get_users_by_username(&self, fragment: &str) -> Result<Vec<User>> {
        self.store
            .find_by_username(fragment)
            .await
            .map_db_err(ErrorKind::Internal, "Something went wrong")
    }

    pub async fn create_user(&self, form: &UserForm) -> Result<User> {
        let now = Utc::now().naive_utc();
        let user = InsertUser {
            username: form.username.clone(),
            password: form.password.clone(),
            firstname: form.firstname.clone(),
            lastname: form.lastname.clone(),
            has_image: form.image_url.is_some(),
            image_url: form.image_url.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert(user)
            .await
            .map_db_err(ErrorKind::CreationFailed, "Error creating user")
    }

    /// Applies the supplied fields onto the stored user. Absent and
    /// empty values leave the stored value alone.
    pub async fn update_user(&self, id: Uuid, form: &UserForm) -> Result<User> {
        let mut user = self
            .store
            .find_by_id(id)
            .await
            .map_db_err(ErrorKind::Internal, "Something went wrong")?
            .ok_or_else(|| Error::not_found("User not found"))?;

        if let Some(username) = non_empty(&form.username) {
            user.username = username.to_string();
        }
        if let Some(firstname) = non_empty(&form.firstname) {
            user.firstname = firstname.to_string();
        }
        if let Some(lastname) = non_empty(&form.lastname) {
            user.lastname = Some(lastname.to_string());
        }
        if let Some(password) = non_empty(&form.password) {
            user.password = password.to_string();
        }
        if let Some(image_url) = non_empty(&form.image_url) {
            user.image_url = Some(image_url.to_string());
        }
        // derived from the effective value, not from the payload
        user.has_image = user.image_url.is_some();
        user.updated_at = Utc::now().naive_utc();

        let saved = self
            .store
            .save(&user)
            .await
            .map_db_err(ErrorKind::UpdateFailed, "Failed to update user")?;
        if !saved {
            return Err(Error::conflict(
                "User was modified concurrently. Retry the request.",
            ));
        }

        Ok(user)
    }

    /// Deletes a user and, through the schema's cascade, every contact
    /// record owned by them. Deleting a missing user is a no-op.
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.store
            .delete_by_id(id)
            .await
            .map_db_err(ErrorKind::Internal, "Something went wrong")?;
        Ok(())
    }
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}
