/// Post handlers - listings, create, like, comment, delete
use super::{message, parse_id};
use crate::error::Result;
use crate::models::{CommentRequest, CreatePostRequest};
use crate::services::{EngagementService, PostService};
use crate::state::AppState;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};

pub async fn all(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = PostService::new(&state).all().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn following(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let posts = PostService::new(&state).following_feed(user_id.0).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn liked(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    let user_id = parse_id(&id, "User not found")?;
    let posts = PostService::new(&state).liked_by(user_id).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn by_user(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = PostService::new(&state).by_username(&username).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .create(user_id.0, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn like(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id, "Post not found")?;
    let likes = EngagementService::new(&state)
        .toggle_like(user_id.0, post_id)
        .await?;
    Ok(HttpResponse::Ok().json(likes))
}

pub async fn comment(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id, "Post not found")?;
    let post = EngagementService::new(&state)
        .comment(user_id.0, post_id, &req.text)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id, "Post not found")?;
    PostService::new(&state).delete(user_id.0, post_id).await?;
    Ok(HttpResponse::Ok().json(message("Post deleted successfully")))
}
