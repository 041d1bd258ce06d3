//! InMemory Notification Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Notification, NotificationId, NotificationRepository, RepositoryError, UserId,
};

/// インメモリ Notification Repository 実装
pub struct InMemoryNotificationRepository {
    /// 通知レコード（挿入順）
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationRepository {
    /// 新しい InMemoryNotificationRepository を作成
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<(), RepositoryError> {
        let mut notifications = self.notifications.lock().await;
        notifications.push(notification);
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let notifications = self.notifications.lock().await;
        Ok(notifications.iter().find(|n| n.id == *id).cloned())
    }

    async fn list_for(&self, recipient: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = self.notifications.lock().await;
        let mut listed: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.recipient == *recipient)
            .cloned()
            .collect();
        // 作成日時の降順（同時刻は挿入の新しいものが先）
        listed.reverse();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), RepositoryError> {
        let mut notifications = self.notifications.lock().await;
        match notifications.iter_mut().find(|n| n.id == *id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, RepositoryError> {
        let mut notifications = self.notifications.lock().await;
        let mut marked = 0;
        for notification in notifications.iter_mut() {
            if notification.recipient == *recipient && !notification.is_read {
                notification.is_read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), RepositoryError> {
        let mut notifications = self.notifications.lock().await;
        let before = notifications.len();
        notifications.retain(|n| n.id != *id);
        if notifications.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
