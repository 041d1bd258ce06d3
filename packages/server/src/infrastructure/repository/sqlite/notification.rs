//! SQLite Notification Repository 実装

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::{
    Notification, NotificationId, NotificationRepository, RepositoryError, UserId,
};

use super::{map_sqlx_err, row::NotificationRow};

/// SQLite Notification Repository 実装
pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    /// 新しい SqliteNotificationRepository を作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO notifications \
             (id, recipient, sender, kind, title, body, is_read, related_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(notification.id.to_string())
        .bind(notification.recipient.as_str())
        .bind(notification.sender.as_str())
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.is_read)
        .bind(notification.related_id.as_deref())
        .bind(notification.created_at.value())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let row: Option<NotificationRow> =
            sqlx::query_as("SELECT * FROM notifications WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        row.map(Notification::try_from).transpose()
    }

    async fn list_for(&self, recipient: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT * FROM notifications WHERE recipient = ? \
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(recipient.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE recipient = ? AND is_read = 0",
        )
        .bind(recipient.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
