/// User handlers - profiles, suggestions, follow toggle, profile update
use super::{message, parse_id};
use crate::error::Result;
use crate::models::{PublicUser, UpdateProfileRequest};
use crate::services::{ProfileService, RelationshipService};
use crate::state::AppState;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};

pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let user = RelationshipService::new(&state).profile(&username).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

pub async fn suggested(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let users: Vec<PublicUser> = RelationshipService::new(&state)
        .suggested(user_id.0)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

pub async fn follow(
    state: web::Data<AppState>,
    user_id: UserId,
    target: web::Path<String>,
) -> Result<HttpResponse> {
    let target = parse_id(&target, "User not found")?;
    let outcome = RelationshipService::new(&state)
        .toggle_follow(user_id.0, target)
        .await?;
    Ok(HttpResponse::Ok().json(message(outcome.message())))
}

pub async fn update(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let user = ProfileService::new(&state)
        .update(user_id.0, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}
