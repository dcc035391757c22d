use error_stack::{Report, Result};
use serde::Deserialize;

use super::ParseError;
use crate::util::figment::FigmentErrorAttachable;

#[derive(Debug, Deserialize)]
pub struct Server {
    /// Address the HTTP server binds to.
    ///
    /// **Environment variables**:
    /// - `ROSTER_IP`
    #[serde(default = "Server::default_ip")]
    pub ip: String,
    /// Port the HTTP server binds to.
    ///
    /// **Environment variables**:
    /// - `ROSTER_PORT`
    #[serde(default = "Server::default_port")]
    pub port: u16,
    pub db: super::Database,
    #[serde(default)]
    pub verification: super::Verification,
}

impl Server {
    pub fn load() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();

        Self::figment()
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))
    }
}

impl Server {
    const DEFAULT_CONFIG_FILE: &'static str = "roster.yml";
    const DEFAULT_PORT: u16 = 8080;

    fn default_ip() -> String {
        "127.0.0.1".to_string()
    }

    const fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }

    /// Creates a default [`figment::Figment`] object to load server
    /// configuration. Split out of [`Server::load`] for testing.
    pub(crate) fn figment() -> figment::Figment {
        use figment::{
            providers::{Env, Format, Yaml},
            Figment,
        };

        Figment::new()
            .merge(Yaml::file(Self::DEFAULT_CONFIG_FILE))
            // The env provider cannot tell a field underscore from a
            // nesting separator, so multi-word keys are remapped by hand.
            .merge(Env::prefixed("ROSTER_").map(|v| match v.as_str() {
                "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
                "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

                "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
                "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

                "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
                "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

                "VERIFICATION_TOKEN_TTL_SECS" => "verification.token_ttl_secs".into(),

                _ => v.as_str().replace('_', ".").into(),
            }))
            // Environment variable aliases
            .merge(Env::raw().map(|v| match v.as_str() {
                "DATABASE_URL" => "db.primary.url".into(),
                _ => v.into(),
            }))
    }
}
