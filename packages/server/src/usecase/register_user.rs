//! UseCase: ユーザー登録処理
//!
//! WebSocket 接続を論理ユーザーに紐づけてコネクションレジストリに登録し、
//! ユーザー ID と同名の個人チャンネルに参加させます。個人チャンネルは
//! チャットルームとは独立した通知配信（`new_notification`）に使われます。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, UserId};

/// ユーザー登録のユースケース
pub struct RegisterUserUseCase {
    /// MessagePusher（コネクションレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RegisterUserUseCase {
    /// 新しい RegisterUserUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// ユーザー登録を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 物理接続の ID
    /// * `user_id` - 登録する論理ユーザーの ID（Domain Model）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// クライアントが申告するロールはサーバーが信用しないため、ここでは
    /// 受け取りません（ロールはイベント名からスタンプされます）。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: PusherChannel,
    ) {
        self.message_pusher
            .register_connection(connection_id, user_id.clone(), sender)
            .await;
        tracing::info!("User '{}' registered connection {}", user_id, connection_id);
    }
}

/// UseCase: 切断処理
///
/// 切断した接続をレジストリから削除します。接続 ID による逆引きで、
/// 該当する 1 エントリだけが削除されます（ルームメンバーシップも解除）。
pub struct DisconnectUseCase {
    /// MessagePusher（コネクションレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectUseCase {
    /// 新しい DisconnectUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 切断を実行
    pub async fn execute(&self, connection_id: &ConnectionId) {
        self.message_pusher.unregister_connection(connection_id).await;
        tracing::info!("Connection {} unregistered", connection_id);
    }
}
