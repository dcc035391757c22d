mod emails;
mod phones;
mod users;

pub use emails::PgEmailStore;
pub use phones::PgPhoneStore;
pub use users::PgUserStore;
