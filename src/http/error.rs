use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::types::{Error, ErrorKind, Message};

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::CreationFailed | ErrorKind::UpdateFailed | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        // client errors are expected traffic, only server errors carry a
        // cause worth logging
        if self.status_code().is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        HttpResponse::build(self.status_code()).json(Message::new(self.message()))
    }
}

/// Remaps the JSON extractor's failures into the uniform message
/// envelope instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| Error::bad_request(err.to_string()).into())
}
