mod email;
mod phone;
mod user;

pub use email::{Email, InsertEmail};
pub use phone::{InsertPhone, Phone};
pub use user::{InsertUser, Role, User};
