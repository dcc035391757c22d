use async_trait::async_trait;
use error_stack::Report;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{EmailStore, PhoneStore, UserStore};
use crate::database::{self, Error as DbError};
use crate::schema::{Email, InsertEmail, InsertPhone, InsertUser, Phone, Role, User};

/// In-memory implementation of all three stores, with the observable
/// semantics of the Postgres ones: not-null and unique columns, owner
/// foreign keys, version compare-and-swap and the delete cascade from
/// users to their contact records.
#[derive(Debug, Default)]
pub(crate) struct MemoryStores {
    state: Mutex<State>,
    fail: AtomicBool,
    conflict_once: AtomicBool,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    emails: Vec<Email>,
    phones: Vec<Phone>,
}

impl MemoryStores {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every following store call fail with a pool error.
    pub(crate) fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Makes exactly the next `save`/`save_all` lose its version race.
    pub(crate) fn conflict_next_save(&self) {
        self.conflict_once.store(true, Ordering::SeqCst);
    }

    fn check_fail(&self) -> database::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Report::new(DbError::Internal(sqlx::Error::PoolClosed)));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.conflict_once.swap(false, Ordering::SeqCst)
    }

    fn constraint(name: impl Into<String>) -> Report<DbError> {
        Report::new(DbError::Constraint(name.into()))
    }
}

fn required<T>(value: Option<T>, column: &str) -> database::Result<T> {
    value.ok_or_else(|| MemoryStores::constraint(format!("null value in column \"{column}\"")))
}

#[async_trait]
impl UserStore for MemoryStores {
    async fn find_by_id(&self, id: Uuid) -> database::Result<Option<User>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_all(&self) -> database::Result<Vec<User>> {
        self.check_fail()?;
        let mut users = self.state.lock().unwrap().users.clone();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn find_by_username(&self, fragment: &str) -> database::Result<Vec<User>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| u.username.contains(fragment))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert(&self, user: InsertUser) -> database::Result<User> {
        self.check_fail()?;
        let username = required(user.username, "username")?;
        let password = required(user.password, "password")?;
        let firstname = required(user.firstname, "firstname")?;

        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.username == username) {
            return Err(Self::constraint("users_username_key"));
        }

        let user = User {
            id: Uuid::new_v4(),
            role: Role::User,
            username,
            password,
            firstname,
            lastname: user.lastname,
            has_image: user.has_image,
            image_url: user.image_url,
            primary_email_id: None,
            primary_phone_id: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_active_at: None,
            version: 0,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> database::Result<bool> {
        self.check_fail()?;
        if self.take_conflict() {
            return Ok(false);
        }

        let mut state = self.state.lock().unwrap();
        let Some(stored) = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id && u.version == user.version)
        else {
            return Ok(false);
        };

        // mirror the UPDATE column list: created_at and the primary
        // contact pointers stay untouched
        *stored = User {
            created_at: stored.created_at,
            primary_email_id: stored.primary_email_id,
            primary_phone_id: stored.primary_phone_id,
            version: user.version + 1,
            ..user.clone()
        };
        Ok(true)
    }

    async fn delete_by_id(&self, id: Uuid) -> database::Result<u64> {
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        let removed = (before - state.users.len()) as u64;

        if removed > 0 {
            // ON DELETE CASCADE
            state.emails.retain(|e| e.user_id != id);
            state.phones.retain(|p| p.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl EmailStore for MemoryStores {
    async fn find_by_owner(&self, user_id: Uuid) -> database::Result<Vec<Email>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        let mut emails: Vec<Email> = state
            .emails
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        emails.sort_by_key(|e| e.created_at);
        Ok(emails)
    }

    async fn find_by_owner_and_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> database::Result<Option<Email>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .emails
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, email: InsertEmail) -> database::Result<Email> {
        self.check_fail()?;
        let address = required(email.email, "email")?;

        let mut state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u.id == email.user_id) {
            return Err(Self::constraint("emails_user_id_fkey"));
        }
        if state.emails.iter().any(|e| e.email == address) {
            return Err(Self::constraint("emails_email_key"));
        }

        let email = Email {
            id: Uuid::new_v4(),
            user_id: email.user_id,
            email: address,
            verified: false,
            primary: false,
            verification_token: None,
            verification_expires_at: None,
            created_at: email.created_at,
            updated_at: email.updated_at,
            version: 0,
        };
        state.emails.push(email.clone());
        Ok(email)
    }

    async fn save(&self, email: &Email) -> database::Result<bool> {
        self.check_fail()?;
        if self.take_conflict() {
            return Ok(false);
        }

        let mut state = self.state.lock().unwrap();
        let Some(stored) = state
            .emails
            .iter_mut()
            .find(|e| e.id == email.id && e.version == email.version)
        else {
            return Ok(false);
        };

        *stored = Email {
            user_id: stored.user_id,
            created_at: stored.created_at,
            version: email.version + 1,
            ..email.clone()
        };
        Ok(true)
    }

    async fn save_all(&self, emails: &[Email]) -> database::Result<bool> {
        self.check_fail()?;
        if self.take_conflict() {
            return Ok(false);
        }

        let mut state = self.state.lock().unwrap();
        // all-or-nothing, like the wrapping transaction
        let all_current = emails.iter().all(|email| {
            state
                .emails
                .iter()
                .any(|e| e.id == email.id && e.version == email.version)
        });
        if !all_current {
            return Ok(false);
        }

        for email in emails {
            if let Some(stored) = state.emails.iter_mut().find(|e| e.id == email.id) {
                *stored = Email {
                    user_id: stored.user_id,
                    created_at: stored.created_at,
                    version: email.version + 1,
                    ..email.clone()
                };
            }
        }
        Ok(true)
    }

    async fn delete_by_owner_and_id(&self, user_id: Uuid, id: Uuid) -> database::Result<u64> {
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let before = state.emails.len();
        state
            .emails
            .retain(|e| !(e.id == id && e.user_id == user_id));
        Ok((before - state.emails.len()) as u64)
    }
}

#[async_trait]
impl PhoneStore for MemoryStores {
    async fn find_by_owner(&self, user_id: Uuid) -> database::Result<Vec<Phone>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        let mut phones: Vec<Phone> = state
            .phones
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        phones.sort_by_key(|p| p.created_at);
        Ok(phones)
    }

    async fn find_by_owner_and_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> database::Result<Option<Phone>> {
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .phones
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, phone: InsertPhone) -> database::Result<Phone> {
        self.check_fail()?;
        let number = required(phone.phone, "phone")?;
        let country_code = required(phone.country_code, "country_code")?;

        let mut state = self.state.lock().unwrap();
        if !state.users.iter().any(|u| u.id == phone.user_id) {
            return Err(Self::constraint("phones_user_id_fkey"));
        }
        if state.phones.iter().any(|p| p.phone == number) {
            return Err(Self::constraint("phones_phone_key"));
        }

        let phone = Phone {
            id: Uuid::new_v4(),
            user_id: phone.user_id,
            phone: number,
            country_code,
            verified: false,
            primary: false,
            verification_token: None,
            verification_expires_at: None,
            created_at: phone.created_at,
            updated_at: phone.updated_at,
            version: 0,
        };
        state.phones.push(phone.clone());
        Ok(phone)
    }

    async fn save(&self, phone: &Phone) -> database::Result<bool> {
        self.check_fail()?;
        if self.take_conflict() {
            return Ok(false);
        }

        let mut state = self.state.lock().unwrap();
        let Some(stored) = state
            .phones
            .iter_mut()
            .find(|p| p.id == phone.id && p.version == phone.version)
        else {
            return Ok(false);
        };

        *stored = Phone {
            user_id: stored.user_id,
            created_at: stored.created_at,
            version: phone.version + 1,
            ..phone.clone()
        };
        Ok(true)
    }

    async fn save_all(&self, phones: &[Phone]) -> database::Result<bool> {
        self.check_fail()?;
        if self.take_conflict() {
            return Ok(false);
        }

        let mut state = self.state.lock().unwrap();
        let all_current = phones.iter().all(|phone| {
            state
                .phones
                .iter()
                .any(|p| p.id == phone.id && p.version == phone.version)
        });
        if !all_current {
            return Ok(false);
        }

        for phone in phones {
            if let Some(stored) = state.phones.iter_mut().find(|p| p.id == phone.id) {
                *stored = Phone {
                    user_id: stored.user_id,
                    created_at: stored.created_at,
                    version: phone.version + 1,
                    ..phone.clone()
                };
            }
        }
        Ok(true)
    }

    async fn delete_by_owner_and_id(&self, user_id: Uuid, id: Uuid) -> database::Result<u64> {
        self.check_fail()?;
        let mut state = self.state.lock().unwrap();
        let before = state.phones.len();
        state
            .phones
            .retain(|p| !(p.id == id && p.user_id == user_id));
        Ok((before - state.phones.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ReportExt;
    use chrono::Utc;

    fn insert_user(username: &str) -> InsertUser {
        let now = Utc::now().naive_utc();
        InsertUser {
            username: Some(username.to_string()),
            password: Some("secret".to_string()),
            firstname: Some("Test".to_string()),
            lastname: None,
            has_image: false,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_applies_only_on_matching_version() {
        let stores = MemoryStores::new();
        let user = UserStore::insert(&*stores, insert_user("alice"))
            .await
            .unwrap();

        let mut fresh = user.clone();
        fresh.firstname = "Alicia".to_string();
        assert!(UserStore::save(&*stores, &fresh).await.unwrap());

        // the first write bumped the version out from under this copy
        let mut stale = user;
        stale.firstname = "Alice the Second".to_string();
        assert!(!UserStore::save(&*stores, &stale).await.unwrap());

        let stored = UserStore::find_by_id(&*stores, fresh.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.firstname, "Alicia");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn duplicate_usernames_are_a_constraint_violation() {
        let stores = MemoryStores::new();
        UserStore::insert(&*stores, insert_user("alice"))
            .await
            .unwrap();

        let error = UserStore::insert(&*stores, insert_user("alice"))
            .await
            .unwrap_err();
        assert!(error.is_constraint());
    }

    #[tokio::test]
    async fn contacts_need_an_existing_owner() {
        let stores = MemoryStores::new();
        let now = Utc::now().naive_utc();
        let error = EmailStore::insert(
            &*stores,
            InsertEmail {
                user_id: Uuid::new_v4(),
                email: Some("ghost@example.com".to_string()),
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap_err();
        assert!(error.is_constraint());
    }
}
