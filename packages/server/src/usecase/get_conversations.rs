//! UseCase: 会話一覧取得処理
//!
//! ユーザーが参加しているメッセージをルームごとにグルーピングし、最新
//! メッセージと未読件数を持つ会話サマリを導出します。読み取り中心の
//! 非権威的なプロジェクションであり、呼び出しごとの完全な再計算で十分な
//! 規模を想定しています（メッセージ量が増えた場合はルーム単位のメモ化が
//! 検討課題）。

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{ConversationSummary, MessageRepository, RoomId, UserId};

use super::error::UseCaseError;

/// 会話一覧取得のユースケース
pub struct GetConversationsUseCase {
    /// Repository（メッセージストアの抽象化）
    message_repository: Arc<dyn MessageRepository>,
}

impl GetConversationsUseCase {
    /// 新しい GetConversationsUseCase を作成
    pub fn new(message_repository: Arc<dyn MessageRepository>) -> Self {
        Self { message_repository }
    }

    /// 会話一覧を取得
    ///
    /// ルームごとに 1 エントリ。最新メッセージのタイムスタンプ降順で
    /// 並べて返します。未読件数は「自分以外が送信し、まだ未読」の件数です。
    pub async fn execute(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationSummary>, UseCaseError> {
        let messages = self.message_repository.messages_involving(user_id).await?;

        // ルームごとにグルーピング（Vec の順序 = 挿入順がタイブレーク）
        let mut by_room: HashMap<RoomId, ConversationSummary> = HashMap::new();
        for message in messages {
            let unread = message.sender_id != *user_id && !message.is_read;
            let other = match message.room_id.other_participant(user_id) {
                Some(other) => other,
                None => continue,
            };

            match by_room.get_mut(&message.room_id) {
                Some(summary) => {
                    if unread {
                        summary.unread_count += 1;
                    }
                    // 挿入順に走査しているため、同時刻なら後のメッセージが勝つ
                    if message.timestamp >= summary.last_message.timestamp {
                        summary.last_message = message;
                    }
                }
                None => {
                    by_room.insert(
                        message.room_id.clone(),
                        ConversationSummary {
                            room_id: message.room_id.clone(),
                            other_participant: other,
                            unread_count: if unread { 1 } else { 0 },
                            last_message: message,
                        },
                    );
                }
            }
        }

        let mut conversations: Vec<ConversationSummary> = by_room.into_values().collect();
        conversations
            .sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
        Ok(conversations)
    }

    /// ルームごとの未読件数を取得（未読のあるルームのみ）
    pub async fn unread_counts(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<(RoomId, u64)>, UseCaseError> {
        let conversations = self.execute(user_id).await?;
        Ok(conversations
            .into_iter()
            .filter(|c| c.unread_count > 0)
            .map(|c| (c.room_id, c.unread_count))
            .collect())
    }
}
