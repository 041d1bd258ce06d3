//! UseCase: 既読化処理
//!
//! ルーム内の「自分以外が送信した」未読メッセージをすべて既読化します。
//! REST（`POST /api/messages/mark-read`）と WebSocket（`mark_as_read`）の
//! 両経路がこの同一のユースケースインスタンスを呼ぶため、どちらの経路を
//! 最後に使っても未読カウントは一致します。

use std::sync::Arc;

use crate::domain::{MessageRepository, RoomId, UserId};

use super::error::UseCaseError;

/// 既読化のユースケース
pub struct MarkMessagesReadUseCase {
    /// Repository（メッセージストアの抽象化）
    message_repository: Arc<dyn MessageRepository>,
}

impl MarkMessagesReadUseCase {
    /// 新しい MarkMessagesReadUseCase を作成
    pub fn new(message_repository: Arc<dyn MessageRepository>) -> Self {
        Self { message_repository }
    }

    /// 既読化を実行
    ///
    /// 現在未読のメッセージだけを反転するため冪等です（二度呼んでも追加の
    /// 効果はありません）。変更した件数を返します。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        caller: &UserId,
    ) -> Result<u64, UseCaseError> {
        let marked = self.message_repository.mark_read(room_id, caller).await?;
        if marked > 0 {
            tracing::debug!(
                "Marked {} message(s) as read in room '{}' for '{}'",
                marked,
                room_id,
                caller
            );
        }
        Ok(marked)
    }
}
