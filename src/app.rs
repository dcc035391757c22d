use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::services::{EmailService, PhoneService, UserService};
use crate::stores::postgres::{PgEmailStore, PgPhoneStore, PgUserStore};
use crate::{config, database};

/// Shared application state handed to every request handler.
#[derive(Debug, Clone)]
pub struct App {
    pub config: Arc<config::Server>,
    pub db: database::Database,
    pub users: UserService,
    pub emails: EmailService,
    pub phones: PhoneService,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
    #[tracing::instrument(skip_all)]
    pub async fn new(cfg: config::Server) -> Result<Self, AppError> {
        let db = database::Database::new(&cfg.db)
            .await
            .change_context(AppError)?;

        let users = Arc::new(PgUserStore::new(db.clone()));
        let emails = Arc::new(PgEmailStore::new(db.clone()));
        let phones = Arc::new(PgPhoneStore::new(db.clone()));

        let app = Self {
            users: UserService::new(users.clone()),
            emails: EmailService::new(users.clone(), emails, &cfg.verification),
            phones: PhoneService::new(users, phones, &cfg.verification),
            config: Arc::new(cfg),
            db,
        };

        Ok(app)
    }

    /// Builds an [`App`] over the in-memory stores. The database handle
    /// points nowhere and never gets touched by handlers under test.
    #[cfg(test)]
    pub(crate) fn for_tests(stores: Arc<crate::stores::memory::MemoryStores>) -> Self {
        use std::num::{NonZeroU32, NonZeroU64};

        let cfg = config::Server {
            ip: "127.0.0.1".to_string(),
            port: 8080,
            db: config::Database {
                primary: config::DbPoolConfig {
                    min_idle: None,
                    pool_size: NonZeroU32::new(1).unwrap(),
                    url: "postgres://localhost/roster_tests".to_string(),
                },
                replica: None,
                enforce_tls: false,
                timeout_secs: NonZeroU64::new(5).unwrap(),
            },
            verification: config::Verification::default(),
        };

        let db = database::Database::connect_lazy(&cfg.db).expect("lazy pool should build");

        Self {
            users: UserService::new(stores.clone()),
            emails: EmailService::new(stores.clone(), stores.clone(), &cfg.verification),
            phones: PhoneService::new(stores.clone(), stores, &cfg.verification),
            config: Arc::new(cfg),
            db,
        }
    }
}
