pub mod app;
pub mod config;
pub mod database;
pub mod http;
pub mod schema;
pub mod services;
pub mod stores;
pub mod types;
pub mod util;

pub use app::App;
