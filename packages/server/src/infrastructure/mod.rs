//! Infrastructure 層
//!
//! ドメイン層が定義するインターフェースの具体的な実装を提供します。
//!
//! - `repository`: メッセージ／ブッキング／通知ストア（インメモリ、SQLite）
//! - `message_pusher`: WebSocket ベースのコネクションレジストリと配信
//! - `dto`: WebSocket / HTTP のワイヤフォーマットとドメインモデルの変換
//! - `database`: SQLite 接続とマイグレーション

pub mod database;
pub mod dto;
pub mod message_pusher;
pub mod repository;
