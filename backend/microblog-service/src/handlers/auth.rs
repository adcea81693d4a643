/// Auth handlers - signup, login, logout, current user
use super::message;
use crate::error::Result;
use crate::models::{LoginRequest, PublicUser, SignupRequest};
use crate::services::AuthService;
use crate::state::{AppState, CookieSettings};
use actix_middleware::{UserId, SESSION_COOKIE};
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use uuid::Uuid;

fn session_cookie(settings: CookieSettings, user_id: Uuid) -> Result<Cookie<'static>> {
    let token = crypto_core::jwt::generate_session_token(user_id)?;

    Ok(Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure)
        .max_age(Duration::days(crypto_core::jwt::SESSION_TOKEN_EXPIRY_DAYS))
        .finish())
}

fn cleared_cookie(settings: CookieSettings) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure)
        .max_age(Duration::ZERO)
        .finish()
}

pub async fn signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let user = AuthService::new(&state).signup(req.into_inner()).await?;
    let cookie = session_cookie(state.cookies, user.id)?;

    Ok(HttpResponse::Created()
        .cookie(cookie)
        .json(PublicUser::from(user)))
}

pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let user = AuthService::new(&state).login(req.into_inner()).await?;
    let cookie = session_cookie(state.cookies, user.id)?;

    Ok(HttpResponse::Ok().cookie(cookie).json(PublicUser::from(user)))
}

pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cleared_cookie(state.cookies))
        .json(message("Logged out successfully"))
}

pub async fn me(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let user = AuthService::new(&state).me(user_id.0).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}
