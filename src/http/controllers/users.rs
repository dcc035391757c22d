use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::parse_id;
use crate::types::form::UserForm;
use crate::types::{Message, Result};
use crate::App;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    username: Option<String>,
}

#[tracing::instrument(skip(app))]
pub async fn list(app: web::Data<App>, params: web::Query<ListParams>) -> Result<HttpResponse> {
    let users = match params.username.as_deref() {
        Some(fragment) => app.users.get_users_by_username(fragment).await?,
        None => app.users.get_all_users().await?,
    };
    Ok(HttpResponse::Ok().json(users))
}

#[tracing::instrument(skip(app))]
pub async fn get(app: web::Data<App>, path: web::Path<String>) -> Result<HttpResponse> {
    let user_id = parse_id(&path)?;
    let user = app.users.get_user_by_id(user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip(app, form))]
pub async fn create(app: web::Data<App>, form: web::Json<UserForm>) -> Result<HttpResponse> {
    app.users.create_user(&form).await?;
    Ok(HttpResponse::Created().json(Message::new("User created successfully")))
}

#[tracing::instrument(skip(app, form))]
pub async fn update(
    app: web::Data<App>,
    path: web::Path<String>,
    form: web::Json<UserForm>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&path)?;
    app.users.update_user(user_id, &form).await?;
    Ok(HttpResponse::Ok().json(Message::new("User updated successfully")))
}
