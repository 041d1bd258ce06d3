//! HTTP API のリクエスト／レスポンス DTO

use serde::{Deserialize, Serialize};

use super::websocket::{MessageDto, NotificationDto};

/// 履歴取得のクエリパラメータ
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    /// このタイムスタンプ（ミリ秒）より古いメッセージだけを返す
    pub before: Option<i64>,
}

/// 履歴取得のレスポンス（時系列順、最新が末尾）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub success: bool,
    pub room_id: String,
    pub messages: Vec<MessageDto>,
    pub has_more: bool,
}

/// 既読化のリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub room_id: String,
    pub user_id: String,
}

/// 既読化のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub success: bool,
    pub marked_read: u64,
}

/// 会話サマリのワイヤ表現
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub room_id: String,
    pub other_participant: String,
    pub last_message: MessageDto,
    pub unread_count: u64,
}

/// 会話一覧のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub success: bool,
    pub conversations: Vec<ConversationDto>,
}

/// ルームごとの未読件数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadRoomDto {
    pub room_id: String,
    pub unread_count: u64,
}

/// 未読件数のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadResponse {
    pub success: bool,
    pub unread: Vec<UnreadRoomDto>,
}

/// 会話削除のクエリパラメータ（明示的な確認マーカーを要求する）
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteConversationQuery {
    pub confirm: Option<bool>,
}

/// 会話削除のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConversationResponse {
    pub success: bool,
    pub deleted: u64,
}

/// 通知一覧のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub success: bool,
    pub notifications: Vec<NotificationDto>,
}

/// 一括既読化のリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadRequest {
    pub user_id: String,
}

/// 成功のみを返すレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub success: bool,
}

/// レビュー作成のリクエスト（外部コラボレータとの境界）
///
/// レビュー CRUD 自体はこのコアのスコープ外。作成成功がメンターへの
/// 通知を発火させる、という境界だけをここで受ける。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub mentor_id: String,
    pub student_id: String,
    pub review_id: String,
    /// 1〜5。境界での検証のみ行う
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

/// レビュー作成のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewResponse {
    pub success: bool,
    pub notification_id: String,
}

/// エラーレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
