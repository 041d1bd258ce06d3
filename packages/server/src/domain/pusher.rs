//! メッセージ送信（通知）とコネクションレジストリのインターフェース
//!
//! 「論理ユーザー ID を与えると、ライブな配信先を列挙できる」という能力を
//! trait として抽象化します。インメモリ実装（`WebSocketMessagePusher`）は
//! Infrastructure 層が提供し、マルチプロセス構成では外部の pub/sub 実装に
//! 差し替えられます（本リポジトリのスコープ外）。
//!
//! レジストリはプロセスローカルな一時状態です。プロセス再起動のたびに
//! ゼロから再構築され、切断時にエントリが削除されます。

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{error::MessagePushError, room::RoomId, user::UserId};

/// クライアントへのメッセージ送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 物理的な WebSocket 接続の識別子
///
/// 一人の論理ユーザーが複数の接続（複数タブ・複数デバイス）を持ち得るため、
/// ユーザー ID とは独立に採番します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい接続 ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メッセージ送信とコネクションレジストリの抽象化
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を論理ユーザーに紐づけて登録し、ユーザーの個人チャンネルに参加させる
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: PusherChannel,
    );

    /// 接続をレジストリから削除（ルームメンバーシップも解除される）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 接続をルームに参加させる（冪等）
    async fn join_room(&self, connection_id: &ConnectionId, room_id: &RoomId);

    /// 論理ユーザーのすべてのライブ接続をルームに参加させる
    ///
    /// 参加させた接続数を返します。相手が一度も `join_chat` を発行して
    /// いなくても返信が届くよう、ピアの接続を先回りして購読させるために
    /// 使います。
    async fn join_room_as_user(&self, user_id: &UserId, room_id: &RoomId) -> usize;

    /// 論理ユーザーがライブ接続を持っているか
    async fn is_online(&self, user_id: &UserId) -> bool;

    /// 論理ユーザーの個人チャンネル（全接続）にメッセージを送信
    async fn push_to_user(&self, user_id: &UserId, content: &str)
    -> Result<(), MessagePushError>;

    /// ルームに参加している全接続にメッセージをブロードキャスト
    ///
    /// 一部の接続への送信失敗は許容されます（ログのみ）。
    async fn broadcast_room(&self, room_id: &RoomId, content: &str);

    /// 指定ユーザーの接続を除いてルームにブロードキャスト（タイピング中継用）
    async fn broadcast_room_excluding(
        &self,
        room_id: &RoomId,
        exclude_user: &UserId,
        content: &str,
    );
}
