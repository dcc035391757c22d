use serde::Deserialize;
use std::num::NonZeroU64;

/// Settings for the contact verification handshake.
#[derive(Debug, Deserialize)]
pub struct Verification {
    /// How long an issued verification token stays usable.
    ///
    /// **Environment variables**:
    /// - `ROSTER_VERIFICATION_TOKEN_TTL_SECS`
    #[serde(default = "Verification::default_token_ttl_secs")]
    pub token_ttl_secs: NonZeroU64,
}

impl Default for Verification {
    fn default() -> Self {
        Self {
            token_ttl_secs: Self::default_token_ttl_secs(),
        }
    }
}

impl Verification {
    const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

    // Required by serde
    const fn default_token_ttl_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_TOKEN_TTL_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_TOKEN_TTL_SECS is accidentally set to 0"),
        }
    }
}
