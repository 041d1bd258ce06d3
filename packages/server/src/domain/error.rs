//! ドメイン層のエラー型

use thiserror::Error;

use super::booking::BookingStatus;

/// ドメインモデルの不変条件違反
///
/// 検証エラー（値オブジェクトの構築失敗、不正な状態遷移）と
/// 認可エラー（遷移を実行する権限がない）を区別します。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("invalid room id: '{0}'")]
    InvalidRoomId(String),

    #[error("message text must be 1..=2000 characters")]
    InvalidMessageText,

    #[error("booking topic must not be empty")]
    EmptyTopic,

    #[error("booking duration must be greater than zero")]
    InvalidDuration,

    #[error("meeting link must start with http:// or https://: '{0}'")]
    InvalidMeetingLink(String),

    #[error("invalid booking transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("only the booking counterparty may update it")]
    NotCounterparty,

    #[error("only students may propose bookings")]
    OnlyStudentsPropose,
}

/// Repository 操作のエラー
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ送信（プッシュ）のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
