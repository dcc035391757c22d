pub mod controllers;
pub mod error;
