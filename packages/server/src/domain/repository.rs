//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装（インメモリ、SQLite）は Infrastructure 層が提供します
//! （依存性の逆転）。
//!
//! メッセージストアと通知ストアは永続化層が所有します。接続レジストリ
//! （`MessagePusher`）はプロセスローカルな一時状態であり、永続化されません。

use async_trait::async_trait;

use super::{
    Timestamp,
    booking::Booking,
    error::RepositoryError,
    message::{ChatMessage, HistoryPage, MessageId},
    notification::{Notification, NotificationId},
    room::RoomId,
    user::UserId,
};

/// メッセージストア（ルームごとの順序付きチャットイベントログ）
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを追加
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// ID でメッセージを取得
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<ChatMessage>, RepositoryError>;

    /// ルーム履歴の 1 ページを取得
    ///
    /// `before` より古いメッセージから新しい順に最大 `limit` 件を選び、
    /// 時系列順（最新が末尾）に並べ替えて返します。`before` が `None` の
    /// 場合は最新のページを返します。
    async fn history(
        &self,
        room_id: &RoomId,
        limit: usize,
        before: Option<Timestamp>,
    ) -> Result<HistoryPage, RepositoryError>;

    /// ルーム内の `reader` 以外が送信した未読メッセージを既読化
    ///
    /// 現在未読のものだけを反転するため冪等です。変更した件数を返します。
    async fn mark_read(&self, room_id: &RoomId, reader: &UserId)
    -> Result<u64, RepositoryError>;

    /// ユーザーが参加しているすべてのメッセージを取得（会話集約用）
    async fn messages_involving(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// ルームの全メッセージを削除（破壊的・取り消し不可）
    ///
    /// 削除した件数を返します。
    async fn delete_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError>;
}

/// ブッキングストア（メッセージから ID で参照される第一級レコード）
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// ブッキングを保存
    async fn insert(&self, booking: Booking) -> Result<(), RepositoryError>;

    /// 元メッセージ ID でブッキングを取得（ブロードキャスト契約のキー）
    async fn find_by_message_id(
        &self,
        message_id: &MessageId,
    ) -> Result<Option<Booking>, RepositoryError>;

    /// 状態遷移後のブッキングを保存
    async fn update(&self, booking: &Booking) -> Result<(), RepositoryError>;

    /// ルームに紐づく全ブッキングを削除（会話削除に追従）
    async fn delete_by_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError>;
}

/// 通知ストア
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 通知を保存
    async fn insert(&self, notification: Notification) -> Result<(), RepositoryError>;

    /// ID で通知を取得
    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;

    /// 受信者の通知を作成日時の降順で取得
    async fn list_for(&self, recipient: &UserId) -> Result<Vec<Notification>, RepositoryError>;

    /// 通知を既読化
    async fn mark_read(&self, id: &NotificationId) -> Result<(), RepositoryError>;

    /// 受信者の全通知を既読化（変更した件数を返す）
    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, RepositoryError>;

    /// 通知を削除
    async fn delete(&self, id: &NotificationId) -> Result<(), RepositoryError>;
}
