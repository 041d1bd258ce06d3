//! チャットメッセージのエンティティ

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Timestamp,
    booking::BookingId,
    error::DomainError,
    room::RoomId,
    user::{SenderRole, UserId},
};

/// メッセージ本文の最大長
const MESSAGE_TEXT_MAX_LENGTH: usize = 2000;

/// メッセージ ID の値オブジェクト（サーバーが採番する UUID v4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// 新しいメッセージ ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 文字列からパース
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(value)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メッセージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Booking,
}

/// メッセージ本文の値オブジェクト
///
/// テキストメッセージは 1〜2000 文字。ブッキングカードは本文なしを
/// 許容します（クライアント側の慣例に合わせて空文字列）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    /// 新しい MessageText を作成（テキストメッセージ用）
    pub fn new(value: String) -> Result<Self, DomainError> {
        if value.is_empty() || value.chars().count() > MESSAGE_TEXT_MAX_LENGTH {
            return Err(DomainError::InvalidMessageText);
        }
        Ok(Self(value))
    }

    /// 空の本文（ブッキングカード用）
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 会話の 1 単位となるチャットメッセージ
///
/// 作成後は不変です。例外は `is_read`（false → true のみ、逆戻りなし）のみ。
/// ブッキングのライフサイクルは `Booking` エンティティ側が持ち、メッセージは
/// `booking_id` で参照するだけです（ブッキング遷移のためにチャットメッセージを
/// 書き換える必要はありません）。
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    /// 会話の相手。ルーム ID の文字列分解ではなく明示的に保持する
    pub recipient_id: UserId,
    pub sender_role: SenderRole,
    pub kind: MessageKind,
    pub text: MessageText,
    /// `kind == Booking` のときのみ Some
    pub booking_id: Option<BookingId>,
    pub is_read: bool,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// テキストメッセージを作成
    pub fn text(
        room_id: RoomId,
        sender_id: UserId,
        recipient_id: UserId,
        sender_role: SenderRole,
        text: MessageText,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            room_id,
            sender_id,
            recipient_id,
            sender_role,
            kind: MessageKind::Text,
            text,
            booking_id: None,
            is_read: false,
            timestamp,
        }
    }

    /// ブッキングカードメッセージを作成
    ///
    /// 本文は任意（純粋なブッキングカードは空文字列）。
    pub fn booking_card(
        room_id: RoomId,
        sender_id: UserId,
        recipient_id: UserId,
        sender_role: SenderRole,
        text: MessageText,
        booking_id: BookingId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            room_id,
            sender_id,
            recipient_id,
            sender_role,
            kind: MessageKind::Booking,
            text,
            booking_id: Some(booking_id),
            is_read: false,
            timestamp,
        }
    }
}

/// ルーム履歴の 1 ページ（時系列順、最新が末尾）
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub messages: Vec<ChatMessage>,
    /// このページより古いメッセージがまだ存在するか
    pub has_more: bool,
}
