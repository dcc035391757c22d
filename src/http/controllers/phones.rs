use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::{parse_id, parse_pair, request_origin};
use crate::types::form::PhoneForm;
use crate::types::{Error, Message, Result};
use crate::App;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    token: Option<String>,
}

#[tracing::instrument(skip(app))]
pub async fn list(app: web::Data<App>, path: web::Path<String>) -> Result<HttpResponse> {
    let user_id = parse_id(&path)?;
    let phones = app.phones.get_all(user_id).await?;
    Ok(HttpResponse::Ok().json(phones))
}

#[tracing::instrument(skip(app))]
pub async fn get(app: web::Data<App>, path: web::Path<(String, String)>) -> Result<HttpResponse> {
    let (user_id, phone_id) = parse_pair(&path)?;
    let phone = app.phones.get_by_id(phone_id, user_id).await?;
    Ok(HttpResponse::Ok().json(phone))
}

#[tracing::instrument(skip(app, form))]
pub async fn create(
    app: web::Data<App>,
    path: web::Path<String>,
    form: web::Json<PhoneForm>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&path)?;
    app.phones.create(&form, user_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Phone created successfully.")))
}

#[tracing::instrument(skip(app, form))]
pub async fn update(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
    form: web::Json<PhoneForm>,
) -> Result<HttpResponse> {
    let (user_id, phone_id) = parse_pair(&path)?;
    app.phones.update(&form, phone_id, user_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Phone updated successfully.")))
}

#[tracing::instrument(skip(app))]
pub async fn delete(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (user_id, phone_id) = parse_pair(&path)?;
    app.phones.delete(phone_id, user_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Phone deleted successfully.")))
}

#[tracing::instrument(skip(app, req))]
pub async fn request_verification(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let (user_id, phone_id) = parse_pair(&path)?;
    let origin = request_origin(&req);
    let url = app
        .phones
        .request_verification(phone_id, user_id, &origin)
        .await?;
    Ok(HttpResponse::Ok().json(Message::new(format!(
        "Verification request sent. URL: {url}"
    ))))
}

#[tracing::instrument(skip(app, params))]
pub async fn verify(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
    params: web::Query<VerifyParams>,
) -> Result<HttpResponse> {
    let (user_id, phone_id) = parse_pair(&path)?;
    let token = params
        .token
        .as_deref()
        .ok_or_else(|| Error::bad_request("Missing required parameter 'token'"))?;

    app.phones.verify_by_id(phone_id, user_id, token).await?;
    Ok(HttpResponse::Ok().json(Message::new("Phone verified successfully.")))
}

#[tracing::instrument(skip(app))]
pub async fn make_primary(
    app: web::Data<App>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (user_id, phone_id) = parse_pair(&path)?;
    app.phones.make_primary(user_id, phone_id).await?;
    Ok(HttpResponse::Ok().json(Message::new("Phone set as primary successfully.")))
}
