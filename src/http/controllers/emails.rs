use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::{parse_id, parse_pair, request_origin};
use crate::types::form::EmailForm;
use crate::types::{Error, Message, Result};
use crate::App;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    token: Option<String>,
}

#[tracing::instrument(skip(app))]
pub async fn list(app: web::Data<App>, path: web::Path<String>) -> Result<HttpResponse> {
    let user_id = parse_id(&path)?;
    let emails = app.emails.get_all(user_id).await?;
    Ok(HttpResponse::Ok().json(emails))
}

#[tracing::instrument(skip(app))]
pub async fn get(app: web::Data<App>, path: web::Path<(String, String)>) -> Result<HttpResponse> {
    let (user_id, email_id) = parse_pair(&path)?;
    let email = app.emails.get_by_id(email_id, user_id).await?;
    Ok(HttpResponse::Ok().json(email))
}

#[tracing::instrument(skip(app, form))]
pub async fn create(
    app: web::Data<App>,
    path: web::Path<String>,
    form: web::Json<EmailForm>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&path)?;
    app.emails.create(&form, user_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Email created successfully.")))
}

#[tracing::instrument(skip(app, form))]
pub async fn update(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
    form: web::Json<EmailForm>,
) -> Result<HttpResponse> {
    let (user_id, email_id) = parse_pair(&path)?;
    app.emails.update(&form, email_id, user_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Email updated successfully.")))
}

#[tracing::instrument(skip(app))]
pub async fn delete(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (user_id, email_id) = parse_pair(&path)?;
    app.emails.delete(email_id, user_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Email deleted successfully.")))
}

#[tracing::instrument(skip(app, req))]
pub async fn request_verification(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let (user_id, email_id) = parse_pair(&path)?;
    let origin = request_origin(&req);
    let url = app
        .emails
        .request_verification(email_id, user_id, &origin)
        .await?;
    Ok(HttpResponse::Ok().json(Message::new(format!("Verification email sent. URL: {url}"))))
}

#[tracing::instrument(skip(app, params))]
pub async fn verify(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
    params: web::Query<VerifyParams>,
) -> Result<HttpResponse> {
    let (user_id, email_id) = parse_pair(&path)?;
    let token = params
        .token
        .as_deref()
        .ok_or_else(|| Error::bad_request("Missing required parameter 'token'"))?;

    app.emails.verify_by_id(email_id, user_id, token).await?;
    Ok(HttpResponse::Ok().json(Message::new("Email verified successfully.")))
}

#[tracing::instrument(skip(app))]
pub async fn make_primary(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (user_id, email_id) = parse_pair(&path)?;
    app.emails.make_primary(user_id, email_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Email set to primary successfully.")))
}
