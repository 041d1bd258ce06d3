//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` と論理ユーザーの対応（コネクションレジストリ）
//! - ルームメンバーシップの管理（接続単位）
//! - クライアントへのメッセージ送信（push_to_user, broadcast_room）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! 一人の論理ユーザーが複数の接続（複数タブ・複数デバイス）を持てるため、
//! レジストリは接続 ID をキーにし、ユーザー ID とルームへの索引を別に
//! 保持します。切断時は接続 ID による逆引きで該当エントリだけを削除します。
//! レジストリ全体が単一の Mutex の下にあり、各イベントハンドラは完了まで
//! 走り切るため、ロック以上の同期は不要です。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomId, UserId};

/// 1 接続ぶんのレジストリエントリ
struct ConnectionEntry {
    user_id: UserId,
    sender: PusherChannel,
}

/// レジストリの内部状態（単一ロックの下で一貫して変更される）
#[derive(Default)]
struct RegistryInner {
    /// 接続 ID → エントリ
    connections: HashMap<ConnectionId, ConnectionEntry>,
    /// 論理ユーザー ID → その接続 ID 群
    users: HashMap<UserId, HashSet<ConnectionId>>,
    /// ルーム ID → 参加している接続 ID 群
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl RegistryInner {
    fn remove_connection(&mut self, connection_id: &ConnectionId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(connection_id)?;
        if let Some(connections) = self.users.get_mut(&entry.user_id) {
            connections.remove(connection_id);
            if connections.is_empty() {
                self.users.remove(&entry.user_id);
            }
        }
        self.rooms.retain(|_, members| {
            members.remove(connection_id);
            !members.is_empty()
        });
        Some(entry)
    }
}

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    inner: Arc<Mutex<RegistryInner>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::default())),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: PusherChannel,
    ) {
        let mut inner = self.inner.lock().await;
        inner.connections.insert(
            connection_id,
            ConnectionEntry {
                user_id: user_id.clone(),
                sender,
            },
        );
        inner
            .users
            .entry(user_id.clone())
            .or_default()
            .insert(connection_id);
        tracing::debug!(
            "Connection {} registered for user '{}'",
            connection_id,
            user_id
        );
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.remove_connection(connection_id) {
            tracing::debug!(
                "Connection {} for user '{}' unregistered",
                connection_id,
                entry.user_id
            );
        }
    }

    async fn join_room(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        let mut inner = self.inner.lock().await;
        if !inner.connections.contains_key(connection_id) {
            tracing::warn!(
                "Cannot join room '{}': connection {} is not registered",
                room_id,
                connection_id
            );
            return;
        }
        inner
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(*connection_id);
    }

    async fn join_room_as_user(&self, user_id: &UserId, room_id: &RoomId) -> usize {
        let mut inner = self.inner.lock().await;
        let connections: Vec<ConnectionId> = inner
            .users
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        if connections.is_empty() {
            return 0;
        }
        let members = inner.rooms.entry(room_id.clone()).or_default();
        let mut joined = 0;
        for connection_id in connections {
            if members.insert(connection_id) {
                joined += 1;
            }
        }
        joined
    }

    async fn is_online(&self, user_id: &UserId) -> bool {
        let inner = self.inner.lock().await;
        inner
            .users
            .get(user_id)
            .is_some_and(|connections| !connections.is_empty())
    }

    async fn push_to_user(
        &self,
        user_id: &UserId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let inner = self.inner.lock().await;
        let connections = inner
            .users
            .get(user_id)
            .filter(|set| !set.is_empty())
            .ok_or_else(|| MessagePushError::ClientNotFound(user_id.to_string()))?;

        for connection_id in connections {
            if let Some(entry) = inner.connections.get(connection_id) {
                // 個人チャンネルでは一部の接続への送信失敗を許容
                if let Err(e) = entry.sender.send(content.to_string()) {
                    tracing::warn!(
                        "Failed to push to connection {} of user '{}': {}",
                        connection_id,
                        user_id,
                        e
                    );
                }
            }
        }
        Ok(())
    }

    async fn broadcast_room(&self, room_id: &RoomId, content: &str) {
        let inner = self.inner.lock().await;
        let Some(members) = inner.rooms.get(room_id) else {
            tracing::debug!("No connections joined to room '{}', skipping broadcast", room_id);
            return;
        };
        for connection_id in members {
            if let Some(entry) = inner.connections.get(connection_id) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = entry.sender.send(content.to_string()) {
                    tracing::warn!(
                        "Failed to broadcast to connection {}: {}",
                        connection_id,
                        e
                    );
                }
            }
        }
    }

    async fn broadcast_room_excluding(
        &self,
        room_id: &RoomId,
        exclude_user: &UserId,
        content: &str,
    ) {
        let inner = self.inner.lock().await;
        let Some(members) = inner.rooms.get(room_id) else {
            return;
        };
        for connection_id in members {
            if let Some(entry) = inner.connections.get(connection_id) {
                if entry.user_id == *exclude_user {
                    continue;
                }
                if let Err(e) = entry.sender.send(content.to_string()) {
                    tracing::warn!(
                        "Failed to relay to connection {}: {}",
                        connection_id,
                        e
                    );
                }
            }
        }
    }
}
