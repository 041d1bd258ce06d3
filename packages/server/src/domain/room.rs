//! 会話ルームの識別子
//!
//! ルームは永続化されたエンティティではなく、二人の参加者 ID から
//! 決定論的に導出される識別子です。最初のメッセージが暗黙的に会話を
//! 作成するため、個別の「会話作成」ステップは存在しません。

use super::{error::DomainError, user::UserId};

/// ルーム ID のプレフィックス
const ROOM_PREFIX: &str = "private_";

/// 二人の参加者間の正準的な会話識別子
///
/// `private_<minId>_<maxId>` 形式。二つの参加者 ID を辞書順にソートして
/// 連結するため、`RoomId::direct(a, b) == RoomId::direct(b, a)` が成り立ちます
/// （対称性）。WebSocket 経路と HTTP 履歴取得経路の双方がこの同一の関数を
/// 呼ぶことで、履歴とライブメッセージが別のルームに分岐しないことを保証します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// 二人の参加者 ID から正準的なルーム ID を導出
    ///
    /// 純粋関数であり、I/O を行いません。
    pub fn direct(a: &UserId, b: &UserId) -> Self {
        let (min, max) = if a.as_str() <= b.as_str() {
            (a, b)
        } else {
            (b, a)
        };
        Self(format!("{}{}_{}", ROOM_PREFIX, min.as_str(), max.as_str()))
    }

    /// 文字列からルーム ID をパース
    ///
    /// 参加者 ID の順序は正準形に正規化されます。
    ///
    /// # Errors
    ///
    /// `private_<a>_<b>` 形式でない場合はエラー
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let rest = value
            .strip_prefix(ROOM_PREFIX)
            .ok_or_else(|| DomainError::InvalidRoomId(value.to_string()))?;
        let (a, b) = rest
            .split_once('_')
            .ok_or_else(|| DomainError::InvalidRoomId(value.to_string()))?;
        let a = UserId::new(a.to_string())
            .map_err(|_| DomainError::InvalidRoomId(value.to_string()))?;
        let b = UserId::new(b.to_string())
            .map_err(|_| DomainError::InvalidRoomId(value.to_string()))?;
        Ok(Self::direct(&a, &b))
    }

    /// 文字列表現を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ルームの二人の参加者を取得
    pub fn participants(&self) -> (UserId, UserId) {
        // direct() / parse() で構築された時点で形式は保証されている
        let rest = self.0.strip_prefix(ROOM_PREFIX).unwrap_or(&self.0);
        let (a, b) = rest.split_once('_').unwrap_or((rest, rest));
        (
            UserId::new(a.to_string()).expect("RoomId holds valid participant ids"),
            UserId::new(b.to_string()).expect("RoomId holds valid participant ids"),
        )
    }

    /// 指定されたユーザーがこのルームの参加者かどうか
    pub fn contains(&self, user_id: &UserId) -> bool {
        let (a, b) = self.participants();
        &a == user_id || &b == user_id
    }

    /// 自分以外の参加者（会話の相手）を取得
    pub fn other_participant(&self, me: &UserId) -> Option<UserId> {
        let (a, b) = self.participants();
        if &a == me {
            Some(b)
        } else if &b == me {
            Some(a)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
