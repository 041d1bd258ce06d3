//! 通知のエンティティ
//!
//! 通知はメッセージとは独立したライフサイクルを持ちます。サーバー側でのみ
//! 作成され、変更は既読化（単体または一括）のみ、削除は受信者の要求による
//! ものだけです。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Timestamp, user::UserId};

/// 通知 ID の値オブジェクト（UUID v4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(value)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 通知の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// レビュー投稿（メンターへ）
    Review,
    /// セッション完了（学生へ、レビュー投稿を促す）
    Booking,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Review => "review",
            NotificationKind::Booking => "booking",
            NotificationKind::System => "system",
        }
    }
}

/// 受信者に配信される永続化された通知
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub sender: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    /// レビューまたはメンターへの参照（レビュー投稿フローへのディープリンク用）
    pub related_id: Option<String>,
    pub created_at: Timestamp,
}

impl Notification {
    /// 新しい通知を未読状態で作成
    pub fn new(
        recipient: UserId,
        sender: UserId,
        kind: NotificationKind,
        title: String,
        body: String,
        related_id: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            recipient,
            sender,
            kind,
            title,
            body,
            is_read: false,
            related_id,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_created_unread() {
        // テスト項目: 新しい通知は未読で作成される
        // given (前提条件):
        let recipient = UserId::new("alice".to_string()).unwrap();
        let sender = UserId::new("bob".to_string()).unwrap();

        // when (操作):
        let notification = Notification::new(
            recipient.clone(),
            sender,
            NotificationKind::Booking,
            "Session completed".to_string(),
            "Your session has been completed.".to_string(),
            Some("bob".to_string()),
            Timestamp::new(1000),
        );

        // then (期待する結果):
        assert!(!notification.is_read);
        assert_eq!(notification.recipient, recipient);
        assert_eq!(notification.kind, NotificationKind::Booking);
        assert_eq!(notification.related_id.as_deref(), Some("bob"));
    }
}
