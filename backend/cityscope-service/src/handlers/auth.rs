/// Auth handlers - registration, login and the current account
use super::{created, ok, ok_with_message};
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::services::{AppState, LoginInput, RegisterInput};
use actix_web::{web, HttpResponse};

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterInput>,
) -> Result<HttpResponse> {
    let session = state.auth.register(body.into_inner()).await?;
    Ok(created("User registered successfully", session))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    let session = state.auth.login(body.into_inner()).await?;
    Ok(ok_with_message("Login successful", session))
}

pub async fn me(state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
    let current = state.users.current_user(user.id).await?;
    Ok(ok(current))
}
