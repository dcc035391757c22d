pub mod error;
pub mod form;
pub mod response;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use response::Message;
