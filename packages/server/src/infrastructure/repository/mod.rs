//! Repository 実装
//!
//! - `inmemory`: HashMap / Vec を使ったインメモリ実装（テストと開発用）
//! - `sqlite`: sqlx + SQLite による永続化実装（本番用）

pub mod inmemory;
pub mod sqlite;

pub use inmemory::{
    InMemoryBookingRepository, InMemoryMessageRepository, InMemoryNotificationRepository,
};
pub use sqlite::{
    SqliteBookingRepository, SqliteMessageRepository, SqliteNotificationRepository,
};
