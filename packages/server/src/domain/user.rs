//! 参加者の識別子とロール

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// ユーザー ID の最大長
const USER_ID_MAX_LENGTH: usize = 64;

/// 論理ユーザー ID の値オブジェクト
///
/// 学生・メンター双方の識別子。英数字とハイフンのみを許可します。
/// アンダースコアを禁止することで、`RoomId`（`private_<a>_<b>` 形式）の
/// 区切り文字と衝突しないことを保証します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// 新しい UserId を作成
    ///
    /// # Errors
    ///
    /// 空文字列、64 文字超、英数字とハイフン以外の文字を含む場合はエラー
    pub fn new(value: String) -> Result<Self, DomainError> {
        if value.is_empty()
            || value.len() > USER_ID_MAX_LENGTH
            || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(DomainError::InvalidUserId(value));
        }
        Ok(Self(value))
    }

    /// 文字列表現を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メッセージ送信者のロール
///
/// 会話ペアリングの中で送信者が持つ役割。サーバーがイベント名から
/// スタンプするため、クライアントから渡されたロールは信用しません。
/// `System` はブッキング完了時にサーバーが合成するメッセージ用の
/// 明示的な自動送信者ロールです。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Mentor,
    System,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Mentor => "mentor",
            SenderRole::System => "system",
        }
    }
}
