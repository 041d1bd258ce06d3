//! UseCase: チャット履歴取得処理
//!
//! HTTP の履歴取得経路と WebSocket の `join_chat` 応答の双方がこの同一の
//! ユースケースを呼びます。ルーム ID の導出（`RoomId::direct`）も含めて
//! 経路間で完全に一致させることで、履歴とライブメッセージが別のルームに
//! 分岐しないことを保証します。

use std::sync::Arc;

use crate::domain::{
    Booking, BookingRepository, ChatMessage, MessageKind, MessageRepository, RoomId, Timestamp,
    UserId,
};

use super::error::UseCaseError;

/// 履歴 1 ページのデフォルト件数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// 履歴上の 1 エントリ（メッセージと、参照先ブッキングの現在状態）
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub message: ChatMessage,
    /// `message.kind == Booking` のとき Some（遷移後の最新状態）
    pub booking: Option<Booking>,
}

/// ルーム履歴の 1 ページ（時系列順、最新が末尾）
#[derive(Debug, Clone)]
pub struct ChatHistory {
    pub room_id: RoomId,
    pub entries: Vec<HistoryEntry>,
    pub has_more: bool,
}

/// チャット履歴取得のユースケース
pub struct GetChatHistoryUseCase {
    /// Repository（メッセージストアの抽象化）
    message_repository: Arc<dyn MessageRepository>,
    /// Repository（ブッキングストアの抽象化）
    booking_repository: Arc<dyn BookingRepository>,
}

impl GetChatHistoryUseCase {
    /// 新しい GetChatHistoryUseCase を作成
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        booking_repository: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            message_repository,
            booking_repository,
        }
    }

    /// 履歴取得を実行
    ///
    /// # Arguments
    ///
    /// * `mentor_id` / `user_id` - 会話の二人の参加者
    /// * `limit` - 1 ページの最大件数
    /// * `before` - このタイムスタンプより古いメッセージだけを対象にする
    pub async fn execute(
        &self,
        mentor_id: &UserId,
        user_id: &UserId,
        limit: usize,
        before: Option<Timestamp>,
    ) -> Result<ChatHistory, UseCaseError> {
        let room_id = RoomId::direct(mentor_id, user_id);
        let page = self
            .message_repository
            .history(&room_id, limit, before)
            .await?;

        // ブッキングカードには参照先ブッキングの最新状態を添付する
        let mut entries = Vec::with_capacity(page.messages.len());
        for message in page.messages {
            let booking = if message.kind == MessageKind::Booking {
                self.booking_repository
                    .find_by_message_id(&message.id)
                    .await?
            } else {
                None
            };
            entries.push(HistoryEntry { message, booking });
        }

        Ok(ChatHistory {
            room_id,
            entries,
            has_more: page.has_more,
        })
    }
}
