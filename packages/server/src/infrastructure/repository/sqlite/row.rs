//! DB 行構造体とドメインモデルへの変換
//!
//! 行のデコードに失敗した場合（不正な UUID、未知の enum 値）は
//! ストア側のデータ破損として `RepositoryError::Unavailable` に写像します。

use sqlx::FromRow;

use crate::domain::{
    Booking, BookingId, BookingStatus, ChatMessage, MeetingLink, MessageId, MessageKind,
    MessageText, Notification, NotificationId, NotificationKind, RepositoryError, RoomId,
    SenderRole, Timestamp, UserId,
};

fn corrupt(what: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("corrupt {what} row: {detail}"))
}

fn parse_user_id(what: &str, value: String) -> Result<UserId, RepositoryError> {
    UserId::new(value).map_err(|e| corrupt(what, e))
}

#[derive(Debug, FromRow)]
pub(crate) struct MessageRow {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub sender_role: String,
    pub kind: String,
    pub text: String,
    pub booking_id: Option<String>,
    pub is_read: bool,
    pub timestamp: i64,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let sender_role = match row.sender_role.as_str() {
            "user" => SenderRole::User,
            "mentor" => SenderRole::Mentor,
            "system" => SenderRole::System,
            other => return Err(corrupt("message", format!("unknown role '{other}'"))),
        };
        let kind = match row.kind.as_str() {
            "text" => MessageKind::Text,
            "booking" => MessageKind::Booking,
            other => return Err(corrupt("message", format!("unknown kind '{other}'"))),
        };
        let text = if row.text.is_empty() {
            MessageText::empty()
        } else {
            MessageText::new(row.text).map_err(|e| corrupt("message", e))?
        };
        let booking_id = row
            .booking_id
            .map(|raw| BookingId::parse(&raw).map_err(|e| corrupt("message", e)))
            .transpose()?;

        Ok(ChatMessage {
            id: MessageId::parse(&row.id).map_err(|e| corrupt("message", e))?,
            room_id: RoomId::parse(&row.room_id).map_err(|e| corrupt("message", e))?,
            sender_id: parse_user_id("message", row.sender_id)?,
            recipient_id: parse_user_id("message", row.recipient_id)?,
            sender_role,
            kind,
            text,
            booking_id,
            is_read: row.is_read,
            timestamp: Timestamp::new(row.timestamp),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct BookingRow {
    pub id: String,
    pub message_id: String,
    pub room_id: String,
    pub student_id: String,
    pub mentor_id: String,
    pub topic: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: i64,
    pub status: String,
    pub meeting_link: Option<String>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "pending" => BookingStatus::Pending,
            "accepted" => BookingStatus::Accepted,
            "declined" => BookingStatus::Declined,
            "completed" => BookingStatus::Completed,
            other => return Err(corrupt("booking", format!("unknown status '{other}'"))),
        };
        let meeting_link = row
            .meeting_link
            .map(|raw| MeetingLink::parse(raw).map_err(|e| corrupt("booking", e)))
            .transpose()?;

        Ok(Booking {
            id: BookingId::parse(&row.id).map_err(|e| corrupt("booking", e))?,
            message_id: MessageId::parse(&row.message_id).map_err(|e| corrupt("booking", e))?,
            room_id: RoomId::parse(&row.room_id).map_err(|e| corrupt("booking", e))?,
            student_id: parse_user_id("booking", row.student_id)?,
            mentor_id: parse_user_id("booking", row.mentor_id)?,
            topic: row.topic,
            date: row.date,
            time: row.time,
            duration_minutes: row.duration_minutes as u32,
            status,
            meeting_link,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct NotificationRow {
    pub id: String,
    pub recipient: String,
    pub sender: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub related_id: Option<String>,
    pub created_at: i64,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RepositoryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "review" => NotificationKind::Review,
            "booking" => NotificationKind::Booking,
            "system" => NotificationKind::System,
            other => return Err(corrupt("notification", format!("unknown kind '{other}'"))),
        };

        Ok(Notification {
            id: NotificationId::parse(&row.id).map_err(|e| corrupt("notification", e))?,
            recipient: parse_user_id("notification", row.recipient)?,
            sender: parse_user_id("notification", row.sender)?,
            kind,
            title: row.title,
            body: row.body,
            is_read: row.is_read,
            related_id: row.related_id,
            created_at: Timestamp::new(row.created_at),
        })
    }
}
