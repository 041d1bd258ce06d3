//! UseCase: メッセージ送信処理
//!
//! テキストメッセージとブッキングカードの永続化を担います。送信者ロールは
//! イベント名（`send_message` / `mentor_reply`）からサーバーがスタンプした
//! ものを受け取り、クライアントが申告するロールは一切信用しません。
//!
//! ブッキングカードの場合、ブッキングはメッセージに埋め込まれるのではなく
//! 第一級レコードとして保存され、メッセージは ID で参照します。セッション
//! 要求を起こせるのは学生ロールのみです。
//!
//! 受信者がライブ接続を持たない場合でもメッセージは永続化され、次回の
//! 履歴取得／再接続時に配信されます（プッシュ通知へのフォールバックは
//! 行いません）。その事実は戻り値の `delivered` で呼び出し元に伝えます。

use std::sync::Arc;

use shitei_shared::time::get_utc_timestamp;

use crate::domain::{
    Booking, BookingDraft, BookingRepository, ChatMessage, MessageKind, MessagePusher,
    MessageRepository, MessageText, RoomId, SenderRole, Timestamp, UserId,
};

use super::error::UseCaseError;

/// メッセージ送信の入力
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub mentor_id: UserId,
    pub user_id: UserId,
    /// サーバーがイベント名からスタンプしたロール（User または Mentor）
    pub sender_role: SenderRole,
    pub kind: MessageKind,
    /// テキストメッセージの本文。ブッキングカードでは省略可
    pub text: Option<String>,
    /// `kind == Booking` のとき必須
    pub booking: Option<BookingDraft>,
    /// クライアント申告のタイムスタンプ（ミリ秒）。省略時はサーバー時刻
    pub timestamp: Option<i64>,
}

/// メッセージ送信の結果
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message: ChatMessage,
    /// ブッキングカードの場合に作成されたブッキング
    pub booking: Option<Booking>,
    /// 受信者がライブ接続を持っていたか（false なら「キュー済み」として通知）
    pub delivered: bool,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（メッセージストアの抽象化）
    message_repository: Arc<dyn MessageRepository>,
    /// Repository（ブッキングストアの抽象化）
    booking_repository: Arc<dyn BookingRepository>,
    /// MessagePusher（コネクションレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        booking_repository: Arc<dyn BookingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            message_repository,
            booking_repository,
            message_pusher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// 検証はすべて永続化の前に完了します。検証に失敗した場合、部分的な
    /// 状態変化は起こりません。
    pub async fn execute(&self, input: SendMessageInput) -> Result<SendOutcome, UseCaseError> {
        let room_id = RoomId::direct(&input.mentor_id, &input.user_id);

        // ロールから送信者と受信者を決定する
        let (sender_id, recipient_id) = match input.sender_role {
            SenderRole::User => (input.user_id.clone(), input.mentor_id.clone()),
            SenderRole::Mentor | SenderRole::System => {
                (input.mentor_id.clone(), input.user_id.clone())
            }
        };

        let timestamp = Timestamp::new(input.timestamp.unwrap_or_else(get_utc_timestamp));

        let (message, booking) = match input.kind {
            MessageKind::Text => {
                let text = MessageText::new(input.text.unwrap_or_default())
                    .map_err(UseCaseError::from)?;
                let message = ChatMessage::text(
                    room_id,
                    sender_id,
                    recipient_id.clone(),
                    input.sender_role,
                    text,
                    timestamp,
                );
                (message, None)
            }
            MessageKind::Booking => {
                // セッション要求を起こせるのは学生のみ
                if input.sender_role != SenderRole::User {
                    return Err(crate::domain::DomainError::OnlyStudentsPropose.into());
                }
                let draft = input.booking.ok_or(UseCaseError::MissingBookingPayload)?;

                // ブッキングカードの本文は任意
                let text = match input.text {
                    Some(t) if !t.is_empty() => {
                        MessageText::new(t).map_err(UseCaseError::from)?
                    }
                    _ => MessageText::empty(),
                };

                let message_id = crate::domain::MessageId::generate();
                let booking = Booking::propose(
                    message_id,
                    room_id.clone(),
                    input.user_id.clone(),
                    input.mentor_id.clone(),
                    draft,
                )
                .map_err(UseCaseError::from)?;

                let mut message = ChatMessage::booking_card(
                    room_id,
                    sender_id,
                    recipient_id.clone(),
                    input.sender_role,
                    text,
                    booking.id,
                    timestamp,
                );
                // ブッキングは元メッセージ ID をブロードキャストのキーとして保持する
                message.id = message_id;
                (message, Some(booking))
            }
        };

        // 永続化（メッセージ → ブッキングの順。ブッキングはメッセージ ID を参照する）
        self.message_repository.append(message.clone()).await?;
        if let Some(ref booking) = booking {
            self.booking_repository.insert(booking.clone()).await?;
        }

        let delivered = self.message_pusher.is_online(&recipient_id).await;
        if !delivered {
            tracing::debug!(
                "Recipient '{}' has no live connection; message {} queued",
                recipient_id,
                message.id
            );
        }

        Ok(SendOutcome {
            message,
            booking,
            delivered,
        })
    }
}
