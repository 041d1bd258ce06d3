//! SQLite Repository 実装
//!
//! sqlx + SQLite による永続化実装。ドメインモデルを直接ストレージに
//! 使うのではなく、DB 行 → 行構造体（DTO）→ ドメインモデルの変換層を
//! 挟みます。

mod booking;
mod message;
mod notification;
mod row;

pub use booking::SqliteBookingRepository;
pub use message::SqliteMessageRepository;
pub use notification::SqliteNotificationRepository;

use crate::domain::RepositoryError;

/// sqlx のエラーを Repository エラーへ写像する
pub(crate) fn map_sqlx_err(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::Unavailable(other.to_string()),
    }
}
