use thiserror::Error;

mod database;
mod server;
mod verification;

pub use database::{Database, DbPoolConfig};
pub use server::Server;
pub use verification::Verification;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
