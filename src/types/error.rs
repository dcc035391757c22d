use error_stack::Report;
use std::borrow::Cow;
use tracing_error::SpanTrace;

use crate::database;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes shared by every service operation.
///
/// The HTTP layer translates each kind into a status code in exactly one
/// place, so services never reach for status codes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is malformed (bad id, missing parameter,
    /// rejected verification token).
    BadRequest,
    /// The addressed user or contact record does not exist.
    NotFound,
    /// A concurrent writer changed the record between our read and our
    /// write. The client should re-fetch and retry.
    Conflict,
    /// Creating a new record failed at the storage layer.
    CreationFailed,
    /// Updating an existing record failed at the storage layer.
    UpdateFailed,
    /// Anything else. The message stays generic and the report carries
    /// the real cause into the logs.
    Internal,
}

/// Error carried from the service layer to the HTTP response.
///
/// `message` is the exact string written into the `{"message"}` body, so
/// it must never leak internals. The optional report keeps the underlying
/// database failure around for logging.
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    report: Option<Report<database::Error>>,
    trace: SpanTrace,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            report: None,
            trace: SpanTrace::capture(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    #[must_use]
    pub fn with_report(mut self, report: Report<database::Error>) -> Self {
        self.report = Some(report);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn report(&self) -> Option<&Report<database::Error>> {
        self.report.as_ref()
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("report", &self.report)
            .field("trace", &self.trace)
            .finish()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

/// Lifts a database result into a service [`Error`] carrying the kind and
/// wire message of the failed operation.
pub trait ResultExt<T> {
    fn map_db_err(self, kind: ErrorKind, message: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for database::Result<T> {
    fn map_db_err(self, kind: ErrorKind, message: &'static str) -> Result<T> {
        self.map_err(|report| Error::new(kind, message).with_report(report))
    }
}
