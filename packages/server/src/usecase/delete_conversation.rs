//! UseCase: 会話削除処理
//!
//! ルームに属するすべてのメッセージと、そこから参照されるブッキングを
//! ハードデリートします。破壊的で取り消し不可能な一括操作であるため、
//! 呼び出し側（UI 層）には明示的な確認ステップ（`confirm` マーカー）を
//! 要求します。確認の強制はハンドラの責務です。

use std::sync::Arc;

use crate::domain::{BookingRepository, MessageRepository, RoomId};

use super::error::UseCaseError;

/// 会話削除のユースケース
pub struct DeleteConversationUseCase {
    /// Repository（メッセージストアの抽象化）
    message_repository: Arc<dyn MessageRepository>,
    /// Repository（ブッキングストアの抽象化）
    booking_repository: Arc<dyn BookingRepository>,
}

impl DeleteConversationUseCase {
    /// 新しい DeleteConversationUseCase を作成
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        booking_repository: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            message_repository,
            booking_repository,
        }
    }

    /// 会話削除を実行
    ///
    /// 削除したメッセージ件数を返します。
    pub async fn execute(&self, room_id: &RoomId) -> Result<u64, UseCaseError> {
        let bookings_deleted = self.booking_repository.delete_by_room(room_id).await?;
        let messages_deleted = self.message_repository.delete_room(room_id).await?;
        tracing::info!(
            "Deleted conversation '{}': {} message(s), {} booking(s)",
            room_id,
            messages_deleted,
            bookings_deleted
        );
        Ok(messages_deleted)
    }
}
