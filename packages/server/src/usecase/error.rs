//! UseCase 層のエラー型
//!
//! エラーの分類（taxonomy）を一箇所で定義します:
//!
//! - 検証エラー: 永続化の前に境界で拒否。部分的な状態変化なし
//! - 認可エラー: 「存在するがあなたのものではない」。変更なし
//! - Not-found エラー: 「存在しない」。認可エラーと区別して返す
//! - 永続化エラー: ストア障害。サーバー側でログに記録
//!
//! REST 経路はこの分類から HTTP ステータスコードへ、WebSocket 経路は
//! `ack` イベントのエラー文字列へ写像します。両経路が同じ分類を共有する
//! ことで、クライアントは「存在しない」と「権限がない」を経路によらず
//! 区別できます。

use thiserror::Error;

use crate::domain::{DomainError, RepositoryError};

/// UseCase 操作のエラー
#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("validation failed: {0}")]
    Validation(DomainError),

    #[error("not authorized: {0}")]
    Unauthorized(DomainError),

    #[error("booking payload is required for booking messages")]
    MissingBookingPayload,

    #[error("meeting link is required to accept a booking")]
    MissingMeetingLink,

    #[error("message '{0}' not found")]
    MessageNotFound(String),

    #[error("booking for message '{0}' not found")]
    BookingNotFound(String),

    #[error("notification '{0}' not found")]
    NotificationNotFound(String),

    #[error("not authorized to access this notification")]
    NotificationOwnerMismatch,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// HTTP / ack への写像に使うエラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Internal,
}

impl UseCaseError {
    /// このエラーの分類を返す
    pub fn kind(&self) -> ErrorKind {
        match self {
            UseCaseError::Validation(_)
            | UseCaseError::MissingBookingPayload
            | UseCaseError::MissingMeetingLink => ErrorKind::Validation,
            UseCaseError::Unauthorized(_) | UseCaseError::NotificationOwnerMismatch => {
                ErrorKind::Unauthorized
            }
            UseCaseError::MessageNotFound(_)
            | UseCaseError::BookingNotFound(_)
            | UseCaseError::NotificationNotFound(_) => ErrorKind::NotFound,
            UseCaseError::Repository(_) => ErrorKind::Internal,
        }
    }
}

impl From<DomainError> for UseCaseError {
    /// ドメインエラーを分類へ振り分ける
    ///
    /// 権限違反（相手方でない、学生以外の提案）は認可エラー、それ以外は
    /// 検証エラーとして扱います。
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotCounterparty | DomainError::OnlyStudentsPropose => {
                UseCaseError::Unauthorized(e)
            }
            other => UseCaseError::Validation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_classification() {
        // テスト項目: ドメインエラーが検証／認可に正しく分類される
        // given (前提条件) / when (操作) / then (期待する結果):
        let authz: UseCaseError = DomainError::NotCounterparty.into();
        assert_eq!(authz.kind(), ErrorKind::Unauthorized);

        let authz: UseCaseError = DomainError::OnlyStudentsPropose.into();
        assert_eq!(authz.kind(), ErrorKind::Unauthorized);

        let validation: UseCaseError = DomainError::EmptyTopic.into();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let not_found = UseCaseError::MessageNotFound("x".to_string());
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let internal: UseCaseError =
            RepositoryError::Unavailable("connection refused".to_string()).into();
        assert_eq!(internal.kind(), ErrorKind::Internal);
    }
}
