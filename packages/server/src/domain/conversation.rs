//! 会話サマリ（読み取り専用のプロジェクション）

use super::{message::ChatMessage, room::RoomId, user::UserId};

/// ユーザーが参加する 1 ルームぶんの会話サマリ
///
/// 永続化されたエンティティではなく、メッセージログから毎回再計算される
/// 読み取り専用のプロジェクションです。
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub room_id: RoomId,
    /// 会話の相手
    pub other_participant: UserId,
    /// 最新のメッセージ
    pub last_message: ChatMessage,
    /// このユーザー宛てでまだ未読のメッセージ数
    pub unread_count: u64,
}
