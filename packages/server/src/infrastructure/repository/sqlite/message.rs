//! SQLite Message Repository 実装

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::{
    ChatMessage, HistoryPage, MessageId, MessageRepository, RepositoryError, RoomId, Timestamp,
    UserId,
};

use super::{map_sqlx_err, row::MessageRow};

/// SQLite Message Repository 実装
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    /// 新しい SqliteMessageRepository を作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO messages \
             (id, room_id, sender_id, recipient_id, sender_role, kind, text, booking_id, is_read, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.room_id.as_str())
        .bind(message.sender_id.as_str())
        .bind(message.recipient_id.as_str())
        .bind(message.sender_role.as_str())
        .bind(match message.kind {
            crate::domain::MessageKind::Text => "text",
            crate::domain::MessageKind::Booking => "booking",
        })
        .bind(message.text.as_str())
        .bind(message.booking_id.map(|id| id.to_string()))
        .bind(message.is_read)
        .bind(message.timestamp.value())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let row: Option<MessageRow> = sqlx::query_as("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(ChatMessage::try_from).transpose()
    }

    async fn history(
        &self,
        room_id: &RoomId,
        limit: usize,
        before: Option<Timestamp>,
    ) -> Result<HistoryPage, RepositoryError> {
        // 新しい順に limit + 1 件取得し、超過の有無で has_more を判定する。
        // 同一タイムスタンプのタイブレークは挿入順（rowid）。
        let fetch_limit = (limit + 1) as i64;
        let rows: Vec<MessageRow> = match before {
            Some(before) => {
                sqlx::query_as(
                    "SELECT * FROM messages WHERE room_id = ? AND timestamp < ? \
                     ORDER BY timestamp DESC, rowid DESC LIMIT ?",
                )
                .bind(room_id.as_str())
                .bind(before.value())
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM messages WHERE room_id = ? \
                     ORDER BY timestamp DESC, rowid DESC LIMIT ?",
                )
                .bind(room_id.as_str())
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        let has_more = rows.len() > limit;
        let mut messages = rows
            .into_iter()
            .take(limit)
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // 取得は新しい順なので、応答の時系列順（最新が末尾）へ反転する
        messages.reverse();

        Ok(HistoryPage { messages, has_more })
    }

    async fn mark_read(
        &self,
        room_id: &RoomId,
        reader: &UserId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1 \
             WHERE room_id = ? AND sender_id <> ? AND is_read = 0",
        )
        .bind(room_id.as_str())
        .bind(reader.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn messages_involving(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM messages WHERE sender_id = ? OR recipient_id = ? \
             ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(user_id.as_str())
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE room_id = ?")
            .bind(room_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}
