//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する `MessageRepository` trait の具体的な実装。
//! Vec をインメモリのメッセージログとして使用します（挿入順 = タイブレーク）。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, HistoryPage, MessageId, MessageRepository, RepositoryError, RoomId, Timestamp,
    UserId,
};

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    /// メッセージログ（挿入順）
    messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        messages.push(message);
        Ok(())
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages.iter().find(|m| m.id == *id).cloned())
    }

    async fn history(
        &self,
        room_id: &RoomId,
        limit: usize,
        before: Option<Timestamp>,
    ) -> Result<HistoryPage, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut filtered: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| {
                m.room_id == *room_id && before.is_none_or(|b| m.timestamp < b)
            })
            .cloned()
            .collect();
        // 安定ソートなので同時刻のメッセージは挿入順を保つ
        filtered.sort_by_key(|m| m.timestamp);

        let has_more = filtered.len() > limit;
        let start = filtered.len().saturating_sub(limit);
        Ok(HistoryPage {
            messages: filtered.split_off(start),
            has_more,
        })
    }

    async fn mark_read(
        &self,
        room_id: &RoomId,
        reader: &UserId,
    ) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.lock().await;
        let mut marked = 0;
        for message in messages.iter_mut() {
            if message.room_id == *room_id && message.sender_id != *reader && !message.is_read {
                message.is_read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn messages_involving(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .filter(|m| m.sender_id == *user_id || m.recipient_id == *user_id)
            .cloned()
            .collect())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.lock().await;
        let before = messages.len();
        messages.retain(|m| m.room_id != *room_id);
        Ok((before - messages.len()) as u64)
    }
}
