//! UseCase: チャット参加処理
//!
//! 呼び出し元の接続をルームに参加させ、相手参加者のライブ接続も先回りして
//! 購読させます（相手がこのペアリングに対して一度も `join_chat` を発行して
//! いなくても返信が届くようにするため）。ルームへの参加は冪等です。
//!
//! 応答として返す履歴は `GetChatHistoryUseCase` に委譲します。HTTP の
//! 履歴取得経路と同一のユースケースを共有することで、両経路のルーム導出と
//! 履歴内容が一致することを保証します。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, UserId};

use super::{
    error::UseCaseError,
    get_chat_history::{ChatHistory, DEFAULT_HISTORY_LIMIT, GetChatHistoryUseCase},
};

/// チャット参加のユースケース
pub struct JoinChatUseCase {
    /// 履歴取得のユースケース（HTTP 経路と共有）
    get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    /// MessagePusher（コネクションレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinChatUseCase {
    /// 新しい JoinChatUseCase を作成
    pub fn new(
        get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            get_chat_history_usecase,
            message_pusher,
        }
    }

    /// チャット参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 呼び出し元の接続
    /// * `caller` - 呼び出し元の論理ユーザー（`register_user` 済み）
    /// * `mentor_id` / `user_id` - 会話の二人の参加者
    ///
    /// # Returns
    ///
    /// ルームの履歴（時系列順の 1 ページ、呼び出し元にのみ返す）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        caller: &UserId,
        mentor_id: &UserId,
        user_id: &UserId,
    ) -> Result<ChatHistory, UseCaseError> {
        let room_id = RoomId::direct(mentor_id, user_id);

        // 1. 呼び出し元の接続をルームに参加させる（冪等）
        self.message_pusher.join_room(connection_id, &room_id).await;

        // 2. 相手参加者のライブ接続も先回りして購読させる
        if let Some(peer) = room_id.other_participant(caller) {
            let joined = self
                .message_pusher
                .join_room_as_user(&peer, &room_id)
                .await;
            if joined > 0 {
                tracing::debug!(
                    "Subscribed {} live connection(s) of peer '{}' to room '{}'",
                    joined,
                    peer,
                    room_id
                );
            }
        }

        // 3. 履歴を返す（HTTP 経路と同一のユースケース）
        self.get_chat_history_usecase
            .execute(mentor_id, user_id, DEFAULT_HISTORY_LIMIT, None)
            .await
    }
}
