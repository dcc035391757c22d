use crate::config;

mod emails;
mod phones;
mod users;

pub use emails::EmailService;
pub use phones::PhoneService;
pub use users::UserService;

/// Alphabet used for verification tokens.
const TOKEN_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LENGTH: usize = 32;

// Keeps the expiry timestamp far away from NaiveDateTime's bounds even
// with an absurd configured ttl.
const MAX_TOKEN_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

fn token_ttl(verification: &config::Verification) -> chrono::Duration {
    let secs = verification.token_ttl_secs.get().min(MAX_TOKEN_TTL_SECS);
    chrono::Duration::seconds(secs as i64)
}

fn mint_token() -> String {
    random_string::generate(TOKEN_LENGTH, TOKEN_CHARSET)
}
