//! WebSocket イベントの DTO
//!
//! すべてのイベントは `event` フィールドでタグ付けされた JSON です。
//! フィールド名はワイヤ上では camelCase（クライアント側の慣例）、
//! イベント名は snake_case です。
//!
//! クライアント → サーバーのイベントは任意の `requestId` を持てます。
//! サーバーはすべてのクライアントイベントに対して同じトランスポート上で
//! `ack` を返し、`requestId` をエコーします（fire-and-forget イベントの
//! 失敗がクライアントから観測できない、という従来プロトコルの欠落を
//! 埋めるための応答チャンネル）。ブロードキャストの契約自体は変わりません。

use serde::{Deserialize, Serialize};

use crate::domain::{BookingStatus, MessageKind, NotificationKind, SenderRole};

/// クライアント → サーバーのイベント
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// 接続を論理ユーザーに紐づける
    RegisterUser {
        user_id: String,
        /// クライアント申告のロール。サーバーは信用せず、ログにのみ使う
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        request_id: Option<String>,
    },
    /// ルームに参加し、履歴を受け取る
    JoinChat {
        mentor_id: String,
        user_id: String,
        #[serde(default)]
        request_id: Option<String>,
    },
    /// 学生としてメッセージを送信（ロールはサーバーが `user` をスタンプ）
    SendMessage {
        mentor_id: String,
        user_id: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(rename = "type", default)]
        kind: Option<MessageKind>,
        #[serde(default)]
        booking: Option<BookingPayload>,
        #[serde(default)]
        timestamp: Option<i64>,
        #[serde(default)]
        request_id: Option<String>,
    },
    /// メンターとして返信（ロールはサーバーが `mentor` をスタンプ）
    MentorReply {
        mentor_id: String,
        user_id: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(rename = "type", default)]
        kind: Option<MessageKind>,
        #[serde(default)]
        booking: Option<BookingPayload>,
        #[serde(default)]
        timestamp: Option<i64>,
        #[serde(default)]
        request_id: Option<String>,
    },
    /// ブッキングの状態遷移を要求
    UpdateBookingStatus {
        message_id: String,
        status: BookingStatus,
        #[serde(default)]
        meeting_link: Option<String>,
        #[serde(default)]
        request_id: Option<String>,
    },
    /// ルームの未読メッセージを既読化（REST と同一の変異に収束する）
    MarkAsRead {
        room_id: String,
        user_id: String,
        #[serde(default)]
        request_id: Option<String>,
    },
    /// タイピング開始（揮発性、永続化されない）
    TypingStart { room_id: String, user_id: String },
    /// タイピング終了
    TypingStop { room_id: String, user_id: String },
}

/// ブッキング提案のペイロード（クライアント → サーバー）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub topic: String,
    pub date: String,
    pub time: String,
    /// セッション長（分）
    pub duration: u32,
}

/// サーバー → クライアントのイベント
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// `join_chat` への応答（呼び出し元にのみ送られる）
    ChatHistory {
        room_id: String,
        messages: Vec<MessageDto>,
    },
    /// 新しいメッセージのルーム配信
    ReceiveMessage { message: MessageDto },
    /// ブッキング遷移後の状態のルーム配信（元メッセージ ID がキー）
    BookingUpdated {
        message_id: String,
        booking: BookingDto,
    },
    /// タイピング中継（送信者を除くルームメンバーへ）
    UserTyping { user_id: String, is_typing: bool },
    /// 受信者がオフラインだったことを送信者に知らせる（情報提供のみ）
    MessageQueued {
        message_id: String,
        recipient: String,
    },
    /// 個人チャンネルへのライブ通知
    NewNotification { notification: NotificationDto },
    /// クライアントイベントへの応答
    Ack {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        /// 応答対象のイベント名
        event: String,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// エラー分類（"validation" | "unauthorized" | "not_found" | "internal"）
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
    },
}

/// メッセージのワイヤ表現
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub sender_role: SenderRole,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
    /// ブッキングカードの場合のみ（参照先ブッキングの現在状態）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingDto>,
    pub is_read: bool,
    pub timestamp: i64,
}

/// ブッキングのワイヤ表現
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: String,
    pub message_id: String,
    pub student_id: String,
    pub mentor_id: String,
    pub topic: String,
    pub date: String,
    pub time: String,
    /// セッション長（分）
    pub duration: u32,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

/// 通知のワイヤ表現
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: String,
    pub recipient: String,
    pub sender: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_message_event() {
        // テスト項目: ブッキング付き send_message イベントがパースできる
        // given (前提条件):
        let raw = r#"{
            "event": "send_message",
            "mentorId": "mentor-1",
            "userId": "student-1",
            "type": "booking",
            "booking": {
                "topic": "Resume review",
                "date": "2025-06-01",
                "time": "14:00",
                "duration": 30
            },
            "timestamp": 1748786400000
        }"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        match event {
            ClientEvent::SendMessage {
                mentor_id,
                user_id,
                kind,
                booking,
                timestamp,
                ..
            } => {
                assert_eq!(mentor_id, "mentor-1");
                assert_eq!(user_id, "student-1");
                assert_eq!(kind, Some(MessageKind::Booking));
                let booking = booking.unwrap();
                assert_eq!(booking.topic, "Resume review");
                assert_eq!(booking.duration, 30);
                assert_eq!(timestamp, Some(1748786400000));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_booking_status_event() {
        // テスト項目: update_booking_status イベントがパースできる
        // given (前提条件):
        let raw = r#"{
            "event": "update_booking_status",
            "messageId": "3f2a8c1e-0000-4000-8000-000000000000",
            "status": "accepted",
            "meetingLink": "https://meet.google.com/xyz"
        }"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        match event {
            ClientEvent::UpdateBookingStatus {
                message_id,
                status,
                meeting_link,
                request_id,
            } => {
                assert_eq!(message_id, "3f2a8c1e-0000-4000-8000-000000000000");
                assert_eq!(status, BookingStatus::Accepted);
                assert_eq!(meeting_link.as_deref(), Some("https://meet.google.com/xyz"));
                assert_eq!(request_id, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_server_event_uses_snake_case_tag() {
        // テスト項目: サーバーイベントのタグが snake_case でシリアライズされる
        // given (前提条件):
        let event = ServerEvent::UserTyping {
            user_id: "alice".to_string(),
            is_typing: true,
        };

        // when (操作):
        let json = serde_json::to_string(&event).unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""event":"user_typing""#));
        assert!(json.contains(r#""userId":"alice""#));
        assert!(json.contains(r#""isTyping":true"#));
    }

    #[test]
    fn test_unknown_event_fails_to_parse() {
        // テスト項目: 未知のイベント名がエラーになる
        // given (前提条件):
        let raw = r#"{"event": "self_destruct"}"#;

        // when (操作):
        let result: Result<ClientEvent, _> = serde_json::from_str(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
