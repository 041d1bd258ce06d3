//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::domain::{RoomId, Timestamp, UserId};
use crate::infrastructure::dto::{
    conversion::{conversation_to_dto, message_to_dto, notification_to_dto},
    http::{
        ConversationsResponse, CreateReviewRequest, CreateReviewResponse,
        DeleteConversationQuery, DeleteConversationResponse, HistoryQuery, HistoryResponse,
        MarkAllReadRequest, MarkReadRequest, MarkReadResponse, NotificationsResponse,
        SimpleResponse, UnreadResponse, UnreadRoomDto,
    },
    websocket::ServerEvent,
};
use crate::usecase::DEFAULT_HISTORY_LIMIT;

use super::super::{error::ApiError, state::AppState};

/// 履歴 1 ページの最大件数
const MAX_HISTORY_LIMIT: usize = 200;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// 呼び出し元の識別ヘッダ（X-User-Id）を取り出す
fn caller_identity(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingCallerIdentity)?;
    Ok(UserId::new(raw.to_string())?)
}

/// `GET /api/messages/{mentor_id}/{user_id}` — paginated room history.
///
/// Queries newest-first but responds in chronological order, with a
/// `hasMore` flag for older pages.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path((mentor_id, user_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let mentor_id = UserId::new(mentor_id)?;
    let user_id = UserId::new(user_id)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let before = query.before.map(Timestamp::new);

    let history = state
        .get_chat_history_usecase
        .execute(&mentor_id, &user_id, limit, before)
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        room_id: history.room_id.as_str().to_string(),
        messages: history
            .entries
            .iter()
            .map(|entry| message_to_dto(&entry.message, entry.booking.as_ref()))
            .collect(),
        has_more: history.has_more,
    }))
}

/// `POST /api/messages/mark-read` — same mutation as the `mark_as_read`
/// websocket event.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let room_id = RoomId::parse(&request.room_id)?;
    let user_id = UserId::new(request.user_id)?;

    let marked_read = state
        .mark_messages_read_usecase
        .execute(&room_id, &user_id)
        .await?;

    Ok(Json(MarkReadResponse {
        success: true,
        marked_read,
    }))
}

/// `GET /api/messages/conversations/{user_id}` — per-user conversation list.
pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let conversations = state.get_conversations_usecase.execute(&user_id).await?;

    Ok(Json(ConversationsResponse {
        success: true,
        conversations: conversations.iter().map(conversation_to_dto).collect(),
    }))
}

/// `GET /api/messages/unread/{user_id}` — unread counts grouped by room.
pub async fn get_unread(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UnreadResponse>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let counts = state
        .get_conversations_usecase
        .unread_counts(&user_id)
        .await?;

    Ok(Json(UnreadResponse {
        success: true,
        unread: counts
            .into_iter()
            .map(|(room_id, unread_count)| UnreadRoomDto {
                room_id: room_id.as_str().to_string(),
                unread_count,
            })
            .collect(),
    }))
}

/// `DELETE /api/messages/conversations/{room_id}?confirm=true`
///
/// Hard-deletes every message (and referenced booking) in the room. The
/// operation is destructive and non-undoable, so the explicit `confirm`
/// marker is required — mirroring the confirm dialog the UI must show.
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<DeleteConversationQuery>,
) -> Result<Json<DeleteConversationResponse>, ApiError> {
    if query.confirm != Some(true) {
        return Err(ApiError::ConfirmationRequired);
    }
    let room_id = RoomId::parse(&room_id)?;

    let deleted = state.delete_conversation_usecase.execute(&room_id).await?;

    Ok(Json(DeleteConversationResponse {
        success: true,
        deleted,
    }))
}

/// `GET /api/notifications/{user_id}` — the caller must be the recipient.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let caller = caller_identity(&headers)?;
    if caller != user_id {
        return Err(ApiError::CallerMismatch);
    }

    let notifications = state.notifications_usecase.list(&user_id).await?;

    Ok(Json(NotificationsResponse {
        success: true,
        notifications: notifications.iter().map(notification_to_dto).collect(),
    }))
}

/// `PUT /api/notifications/{id}/read`
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SimpleResponse>, ApiError> {
    let caller = caller_identity(&headers)?;
    state.notifications_usecase.mark_read(&id, &caller).await?;
    Ok(Json(SimpleResponse { success: true }))
}

/// `PUT /api/notifications/read-all`
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<MarkAllReadRequest>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let user_id = UserId::new(request.user_id)?;
    let caller = caller_identity(&headers)?;
    if caller != user_id {
        return Err(ApiError::CallerMismatch);
    }

    let marked_read = state.notifications_usecase.mark_all_read(&user_id).await?;

    Ok(Json(MarkReadResponse {
        success: true,
        marked_read,
    }))
}

/// `DELETE /api/notifications/{id}`
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SimpleResponse>, ApiError> {
    let caller = caller_identity(&headers)?;
    state.notifications_usecase.delete(&id, &caller).await?;
    Ok(Json(SimpleResponse { success: true }))
}

/// `POST /api/reviews` — external-collaborator boundary.
///
/// Review CRUD itself lives outside this core; its only effect here is the
/// notification to the reviewed mentor, pushed live when the mentor has a
/// connection.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<CreateReviewResponse>, ApiError> {
    if let Some(rating) = request.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::InvalidRating);
        }
    }
    let mentor_id = UserId::new(request.mentor_id)?;
    let student_id = UserId::new(request.student_id)?;

    let outcome = state
        .notifications_usecase
        .create_review_notification(mentor_id.clone(), student_id, request.review_id)
        .await?;

    if outcome.mentor_online {
        let event = ServerEvent::NewNotification {
            notification: notification_to_dto(&outcome.notification),
        };
        let payload = serde_json::to_string(&event).unwrap();
        if let Err(e) = state.message_pusher.push_to_user(&mentor_id, &payload).await {
            tracing::warn!("Failed to push review notification live: {}", e);
        }
    }

    Ok(Json(CreateReviewResponse {
        success: true,
        notification_id: outcome.notification.id.to_string(),
    }))
}
