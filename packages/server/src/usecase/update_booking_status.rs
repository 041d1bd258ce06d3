//! UseCase: ブッキング状態更新処理
//!
//! ブッキングのステートマシン（`pending → accepted → completed` /
//! `pending → declined`）を駆動します。検証と遷移チェックはブロードキャストの
//! 前に単一のハンドラ呼び出し内で同期的に完了するため、ブロードキャストは
//! 常に遷移後の状態を反映します（中間状態が観測されることはありません）。
//!
//! `accepted → completed` の副作用:
//!
//! 1. 同じルームにお礼のテキストメッセージを合成する（送信者 ID はメンター、
//!    ロールは明示的な `system`）。通常のメッセージと同様に永続化・配信される
//! 2. 学生への通知を作成する。`related_id` はメンター ID（後でそのメンターの
//!    レビュー投稿フローへディープリンクするため）であり、ブッキングや
//!    メッセージ自体ではない
//!
//! ブッキング更新・合成メッセージ・通知は 3 つの独立した書き込みであり、
//! 横断的な原子性はありません（ベストエフォート設計）。副作用の書き込みに
//! 失敗した場合はログに記録し、遷移自体は成立したものとして扱います。

use std::sync::Arc;

use shitei_shared::time::get_utc_timestamp;

use crate::domain::{
    Booking, BookingRepository, BookingStatus, ChatMessage, MeetingLink, MessageId,
    MessagePusher, MessageRepository, MessageText, Notification, NotificationKind,
    NotificationRepository, SenderRole, Timestamp, UserId,
};

use super::error::UseCaseError;

/// `accepted → completed` で発生した副作用
#[derive(Debug, Clone)]
pub struct CompletionSideEffects {
    /// 合成されたお礼メッセージ
    pub message: ChatMessage,
    /// 学生への通知
    pub notification: Notification,
    /// 学生がライブ接続を持っていたか（true なら `new_notification` を配信）
    pub student_online: bool,
}

/// ブッキング状態更新の結果
#[derive(Debug, Clone)]
pub struct BookingUpdateOutcome {
    /// 遷移後のブッキング
    pub booking: Booking,
    /// completed への遷移でのみ Some
    pub completion: Option<CompletionSideEffects>,
}

/// ブッキング状態更新のユースケース
pub struct UpdateBookingStatusUseCase {
    /// Repository（メッセージストアの抽象化）
    message_repository: Arc<dyn MessageRepository>,
    /// Repository（ブッキングストアの抽象化）
    booking_repository: Arc<dyn BookingRepository>,
    /// Repository（通知ストアの抽象化）
    notification_repository: Arc<dyn NotificationRepository>,
    /// MessagePusher（コネクションレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl UpdateBookingStatusUseCase {
    /// 新しい UpdateBookingStatusUseCase を作成
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        booking_repository: Arc<dyn BookingRepository>,
        notification_repository: Arc<dyn NotificationRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            message_repository,
            booking_repository,
            notification_repository,
            message_pusher,
        }
    }

    /// ブッキング状態更新を実行
    ///
    /// # Arguments
    ///
    /// * `actor` - 遷移を要求した参加者（相手方＝メンターのみが許可される）
    /// * `message_id` - ブッキングカードの元メッセージ ID（ブロードキャスト契約のキー）
    /// * `status` - 遷移先の状態
    /// * `meeting_link` - `accepted` への遷移でのみ必須
    ///
    /// 終端状態のブッキングや存在しないメッセージ／ブッキングを対象にした
    /// 要求は、状態を変更せずブロードキャストもせずに拒否されます。
    pub async fn execute(
        &self,
        actor: &UserId,
        message_id: &str,
        status: BookingStatus,
        meeting_link: Option<String>,
    ) -> Result<BookingUpdateOutcome, UseCaseError> {
        let message_id = MessageId::parse(message_id)
            .map_err(|_| UseCaseError::MessageNotFound(message_id.to_string()))?;

        let mut booking = self
            .booking_repository
            .find_by_message_id(&message_id)
            .await?
            .ok_or_else(|| UseCaseError::BookingNotFound(message_id.to_string()))?;

        match status {
            BookingStatus::Accepted => {
                let raw_link = meeting_link.ok_or(UseCaseError::MissingMeetingLink)?;
                let link = MeetingLink::parse(raw_link).map_err(UseCaseError::from)?;
                booking.accept(actor, link).map_err(UseCaseError::from)?;
            }
            BookingStatus::Declined => {
                booking.decline(actor).map_err(UseCaseError::from)?;
            }
            BookingStatus::Completed => {
                booking.complete(actor).map_err(UseCaseError::from)?;
            }
            BookingStatus::Pending => {
                // いかなる状態からも pending へは戻れない
                return Err(crate::domain::DomainError::InvalidTransition {
                    from: booking.status,
                    to: BookingStatus::Pending,
                }
                .into());
            }
        }

        self.booking_repository.update(&booking).await?;
        tracing::info!(
            "Booking {} transitioned to {} by '{}'",
            booking.id,
            booking.status,
            actor
        );

        let completion = if booking.status == BookingStatus::Completed {
            self.run_completion_side_effects(&booking).await
        } else {
            None
        };

        Ok(BookingUpdateOutcome {
            booking,
            completion,
        })
    }

    /// completed 遷移の副作用（お礼メッセージの合成と学生への通知）
    ///
    /// 遷移自体は既に永続化されているため、ここでの失敗はログに記録して
    /// 飲み込みます（ベストエフォート）。
    async fn run_completion_side_effects(
        &self,
        booking: &Booking,
    ) -> Option<CompletionSideEffects> {
        let now = Timestamp::new(get_utc_timestamp());

        let text = MessageText::new(format!(
            "Your session \"{}\" is complete. Thank you for learning together! \
             Feel free to leave a review.",
            booking.topic
        ))
        .ok()?;

        let message = ChatMessage::text(
            booking.room_id.clone(),
            booking.mentor_id.clone(),
            booking.student_id.clone(),
            SenderRole::System,
            text,
            now,
        );

        if let Err(e) = self.message_repository.append(message.clone()).await {
            tracing::error!(
                "Failed to persist completion message for booking {}: {}",
                booking.id,
                e
            );
            return None;
        }

        let notification = Notification::new(
            booking.student_id.clone(),
            booking.mentor_id.clone(),
            NotificationKind::Booking,
            "Session completed".to_string(),
            format!(
                "Your session \"{}\" has been completed. Share your experience by \
                 leaving a review for your mentor.",
                booking.topic
            ),
            Some(booking.mentor_id.as_str().to_string()),
            now,
        );

        if let Err(e) = self.notification_repository.insert(notification.clone()).await {
            tracing::error!(
                "Failed to persist completion notification for booking {}: {}",
                booking.id,
                e
            );
            return None;
        }

        let student_online = self.message_pusher.is_online(&booking.student_id).await;

        Some(CompletionSideEffects {
            message,
            notification,
            student_online,
        })
    }
}
