/// Notification handlers
use super::{message, parse_id};
use crate::error::Result;
use crate::services::NotificationService;
use crate::state::AppState;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};

pub async fn list(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let notifications = NotificationService::new(&state).list(user_id.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn delete_all(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    NotificationService::new(&state).delete_all(user_id.0).await?;
    Ok(HttpResponse::Ok().json(message("Notifications deleted successfully")))
}

pub async fn delete_one(
    state: web::Data<AppState>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let notification_id = parse_id(&id, "Notification not found")?;
    NotificationService::new(&state)
        .delete_one(user_id.0, notification_id)
        .await?;
    Ok(HttpResponse::Ok().json(message("Notification deleted successfully")))
}
