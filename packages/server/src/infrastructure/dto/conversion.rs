//! Domain Model から DTO への変換

use crate::domain::{Booking, BookingDraft, ChatMessage, ConversationSummary, Notification};

use super::http::ConversationDto;
use super::websocket::{BookingDto, BookingPayload, MessageDto, NotificationDto};

/// ChatMessage（と参照先ブッキング）をワイヤ表現へ変換
pub fn message_to_dto(message: &ChatMessage, booking: Option<&Booking>) -> MessageDto {
    MessageDto {
        id: message.id.to_string(),
        room_id: message.room_id.as_str().to_string(),
        sender_id: message.sender_id.as_str().to_string(),
        recipient_id: message.recipient_id.as_str().to_string(),
        sender_role: message.sender_role,
        kind: message.kind,
        text: message.text.as_str().to_string(),
        booking: booking.map(booking_to_dto),
        is_read: message.is_read,
        timestamp: message.timestamp.value(),
    }
}

/// Booking をワイヤ表現へ変換
pub fn booking_to_dto(booking: &Booking) -> BookingDto {
    BookingDto {
        id: booking.id.to_string(),
        message_id: booking.message_id.to_string(),
        student_id: booking.student_id.as_str().to_string(),
        mentor_id: booking.mentor_id.as_str().to_string(),
        topic: booking.topic.clone(),
        date: booking.date.clone(),
        time: booking.time.clone(),
        duration: booking.duration_minutes,
        status: booking.status,
        meeting_link: booking
            .meeting_link
            .as_ref()
            .map(|link| link.as_str().to_string()),
    }
}

/// Notification をワイヤ表現へ変換
pub fn notification_to_dto(notification: &Notification) -> NotificationDto {
    NotificationDto {
        id: notification.id.to_string(),
        recipient: notification.recipient.as_str().to_string(),
        sender: notification.sender.as_str().to_string(),
        kind: notification.kind,
        title: notification.title.clone(),
        message: notification.body.clone(),
        is_read: notification.is_read,
        related_id: notification.related_id.clone(),
        created_at: notification.created_at.value(),
    }
}

/// ConversationSummary をワイヤ表現へ変換
pub fn conversation_to_dto(summary: &ConversationSummary) -> ConversationDto {
    ConversationDto {
        room_id: summary.room_id.as_str().to_string(),
        other_participant: summary.other_participant.as_str().to_string(),
        last_message: message_to_dto(&summary.last_message, None),
        unread_count: summary.unread_count,
    }
}

/// 受信したブッキングペイロードをドメインのドラフトへ変換
pub fn booking_payload_to_draft(payload: BookingPayload) -> BookingDraft {
    BookingDraft {
        topic: payload.topic,
        date: payload.date,
        time: payload.time,
        duration_minutes: payload.duration,
    }
}
