/// Notification inbox
use crate::db::NotificationRepository;
use crate::error::{AppError, Result};
use crate::models::NotificationView;
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;

pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            notifications: state.notifications.clone(),
        }
    }

    /// Return the recipient's notifications, then mark exactly those read.
    ///
    /// The returned list shows the flags as they were before marking.
    pub async fn list(&self, recipient: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self.notifications.list_for_recipient(recipient).await?;

        let unread: Vec<Uuid> = notifications
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect();
        if !unread.is_empty() {
            let marked = self.notifications.mark_read(&unread).await?;
            tracing::debug!(user_id = %recipient, marked, "notifications marked read");
        }

        Ok(notifications)
    }

    pub async fn delete_all(&self, recipient: Uuid) -> Result<u64> {
        let deleted = self.notifications.delete_for_recipient(recipient).await?;
        tracing::info!(user_id = %recipient, deleted, "notifications deleted");
        Ok(deleted)
    }

    pub async fn delete_one(&self, recipient: Uuid, notification_id: Uuid) -> Result<()> {
        let notification = self
            .notifications
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification not found"))?;

        if notification.to_user_id != recipient {
            return Err(AppError::forbidden(
                "You are not allowed to delete this notification",
            ));
        }

        self.notifications.delete(notification_id).await?;
        Ok(())
    }
}
