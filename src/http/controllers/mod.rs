use actix_web::{web, HttpRequest};
use uuid::Uuid;

use crate::types::{Error, Result};

pub mod emails;
pub mod phones;
pub mod users;


pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list))
                    .route("", web::post().to(users::create))
                    .route("/{user_id}", web::get().to(users::get))
                    .route("/{user_id}", web::put().to(users::update)),
            )
            .service(
                web::scope("/user/{user_id}")
                    .route("/email", web::get().to(emails::list))
                    .route("/emails", web::get().to(emails::list))
                    .route("/email", web::post().to(emails::create))
                    .route("/email/{email_id}", web::get().to(emails::get))
                    .route("/email/{email_id}", web::put().to(emails::update))
                    .route("/email/{email_id}", web::delete().to(emails::delete))
                    .route(
                        "/email/{email_id}/request-verification",
                        web::post().to(emails::request_verification),
                    )
                    .route("/email/{email_id}/verify", web::post().to(emails::verify))
                    .route(
                        "/email/{email_id}/make-primary",
                        web::post().to(emails::make_primary),
                    )
                    .route("/phone", web::get().to(phones::list))
                    .route("/phones", web::get().to(phones::list))
                    .route("/phone", web::post().to(phones::create))
                    .route("/phone/{phone_id}", web::get().to(phones::get))
                    .route("/phone/{phone_id}", web::put().to(phones::update))
                    .route("/phone/{phone_id}", web::delete().to(phones::delete))
                    .route(
                        "/phone/{phone_id}/request-verification",
                        web::post().to(phones::request_verification),
                    )
                    .route("/phone/{phone_id}/verify", web::post().to(phones::verify))
                    .route(
                        "/phone/{phone_id}/make-primary",
                        web::post().to(phones::make_primary),
                    ),
            ),
    );
}

/// Path ids arrive as raw strings so that a malformed UUID maps to the
/// uniform 400 envelope instead of the framework's default error page.
pub(crate) fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::bad_request("Invalid UUID format"))
}

pub(crate) fn parse_pair(path: &(String, String)) -> Result<(Uuid, Uuid)> {
    Ok((parse_id(&path.0)?, parse_id(&path.1)?))
}

/// Scheme and authority of the incoming request, used to build absolute
/// verification URLs.
pub(crate) fn request_origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}
