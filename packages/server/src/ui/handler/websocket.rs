//! WebSocket connection handlers.
//!
//! One connection = one `ConnectionId`. Identity is established by the
//! `register_user` event; the sender role on messages is stamped from the
//! event name (`send_message` → user, `mentor_reply` → mentor), never from
//! a client-supplied role field.
//!
//! Every client event is answered with an `ack` on the same connection
//! (echoing the optional `requestId`), so failures of fire-and-forget
//! events are observable without changing the broadcast fan-out contract.
//! Persistence failures are logged and surface only in the ack — they
//! never tear down the connection.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, MessageKind, PusherChannel, RoomId, SenderRole, UserId};
use crate::infrastructure::dto::{
    conversion::{booking_payload_to_draft, booking_to_dto, message_to_dto, notification_to_dto},
    websocket::{BookingPayload, ClientEvent, ServerEvent},
};
use crate::usecase::{ErrorKind, SendMessageInput, UseCaseError};

use super::super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This function handles the outbound message flow: broadcasts, personal
/// notifications and acks (via the connection's registered channel) are
/// sent to this client's WebSocket connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let tx_clone = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        // Identity established by register_user, used as the acting party
        // for join_chat and booking transitions
        let mut registered_user: Option<UserId> = None;

        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse client event: {}", e);
                            send_event(
                                &tx_clone,
                                &plain_error_ack(
                                    "unknown",
                                    None,
                                    "validation",
                                    &format!("malformed event: {e}"),
                                ),
                            );
                            continue;
                        }
                    };

                    handle_event(
                        &state_clone,
                        connection_id,
                        &mut registered_user,
                        &tx_clone,
                        event,
                    )
                    .await;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection {} requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Remove the connection from the registry (reverse lookup by connection id)
    state.disconnect_usecase.execute(&connection_id).await;
}

/// Dispatch a parsed client event.
async fn handle_event(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    registered_user: &mut Option<UserId>,
    tx: &PusherChannel,
    event: ClientEvent,
) {
    match event {
        ClientEvent::RegisterUser {
            user_id,
            role,
            request_id,
        } => {
            let user_id = match UserId::new(user_id) {
                Ok(user_id) => user_id,
                Err(e) => {
                    send_event(tx, &error_ack("register_user", request_id, &e.into()));
                    return;
                }
            };
            if let Some(role) = role {
                tracing::debug!("User '{}' registered with claimed role '{}'", user_id, role);
            }
            state
                .register_user_usecase
                .execute(connection_id, user_id.clone(), tx.clone())
                .await;
            *registered_user = Some(user_id);
            send_event(tx, &ok_ack("register_user", request_id));
        }

        ClientEvent::JoinChat {
            mentor_id,
            user_id,
            request_id,
        } => {
            let Some(caller) = registered_user.clone() else {
                send_event(
                    tx,
                    &plain_error_ack(
                        "join_chat",
                        request_id,
                        "unauthorized",
                        "register_user must be issued before join_chat",
                    ),
                );
                return;
            };
            let parsed = UserId::new(mentor_id).and_then(|m| Ok((m, UserId::new(user_id)?)));
            let (mentor_id, user_id) = match parsed {
                Ok(ids) => ids,
                Err(e) => {
                    send_event(tx, &error_ack("join_chat", request_id, &e.into()));
                    return;
                }
            };

            match state
                .join_chat_usecase
                .execute(&connection_id, &caller, &mentor_id, &user_id)
                .await
            {
                Ok(history) => {
                    let event = ServerEvent::ChatHistory {
                        room_id: history.room_id.as_str().to_string(),
                        messages: history
                            .entries
                            .iter()
                            .map(|entry| message_to_dto(&entry.message, entry.booking.as_ref()))
                            .collect(),
                    };
                    send_event(tx, &event);
                    send_event(tx, &ok_ack("join_chat", request_id));
                }
                Err(e) => {
                    tracing::warn!("join_chat failed: {}", e);
                    send_event(tx, &error_ack("join_chat", request_id, &e));
                }
            }
        }

        ClientEvent::SendMessage {
            mentor_id,
            user_id,
            message,
            kind,
            booking,
            timestamp,
            request_id,
        } => {
            handle_send(
                state,
                tx,
                "send_message",
                SenderRole::User,
                mentor_id,
                user_id,
                message,
                kind,
                booking,
                timestamp,
                request_id,
            )
            .await;
        }

        ClientEvent::MentorReply {
            mentor_id,
            user_id,
            message,
            kind,
            booking,
            timestamp,
            request_id,
        } => {
            handle_send(
                state,
                tx,
                "mentor_reply",
                SenderRole::Mentor,
                mentor_id,
                user_id,
                message,
                kind,
                booking,
                timestamp,
                request_id,
            )
            .await;
        }

        ClientEvent::UpdateBookingStatus {
            message_id,
            status,
            meeting_link,
            request_id,
        } => {
            let Some(actor) = registered_user.clone() else {
                send_event(
                    tx,
                    &plain_error_ack(
                        "update_booking_status",
                        request_id,
                        "unauthorized",
                        "register_user must be issued before update_booking_status",
                    ),
                );
                return;
            };

            match state
                .update_booking_status_usecase
                .execute(&actor, &message_id, status, meeting_link)
                .await
            {
                Ok(outcome) => {
                    // Broadcasts always reflect the post-transition state
                    let updated = ServerEvent::BookingUpdated {
                        message_id: outcome.booking.message_id.to_string(),
                        booking: booking_to_dto(&outcome.booking),
                    };
                    state
                        .message_pusher
                        .broadcast_room(&outcome.booking.room_id, &to_json(&updated))
                        .await;

                    if let Some(completion) = outcome.completion {
                        let thank_you = ServerEvent::ReceiveMessage {
                            message: message_to_dto(&completion.message, None),
                        };
                        state
                            .message_pusher
                            .broadcast_room(&outcome.booking.room_id, &to_json(&thank_you))
                            .await;

                        if completion.student_online {
                            let notification = ServerEvent::NewNotification {
                                notification: notification_to_dto(&completion.notification),
                            };
                            if let Err(e) = state
                                .message_pusher
                                .push_to_user(
                                    &outcome.booking.student_id,
                                    &to_json(&notification),
                                )
                                .await
                            {
                                tracing::warn!(
                                    "Failed to push completion notification: {}",
                                    e
                                );
                            }
                        }
                    }
                    send_event(tx, &ok_ack("update_booking_status", request_id));
                }
                Err(e) => {
                    tracing::warn!("update_booking_status rejected: {}", e);
                    send_event(tx, &error_ack("update_booking_status", request_id, &e));
                }
            }
        }

        ClientEvent::MarkAsRead {
            room_id,
            user_id,
            request_id,
        } => {
            let parsed = RoomId::parse(&room_id).and_then(|r| Ok((r, UserId::new(user_id)?)));
            let (room_id, user_id) = match parsed {
                Ok(ids) => ids,
                Err(e) => {
                    send_event(tx, &error_ack("mark_as_read", request_id, &e.into()));
                    return;
                }
            };
            match state
                .mark_messages_read_usecase
                .execute(&room_id, &user_id)
                .await
            {
                Ok(_) => send_event(tx, &ok_ack("mark_as_read", request_id)),
                Err(e) => send_event(tx, &error_ack("mark_as_read", request_id, &e)),
            }
        }

        ClientEvent::TypingStart { room_id, user_id } => {
            relay_typing(state, tx, room_id, user_id, true).await;
        }
        ClientEvent::TypingStop { room_id, user_id } => {
            relay_typing(state, tx, room_id, user_id, false).await;
        }
    }
}

/// Persist and fan out a message (shared by `send_message` / `mentor_reply`).
#[allow(clippy::too_many_arguments)]
async fn handle_send(
    state: &Arc<AppState>,
    tx: &PusherChannel,
    event_name: &'static str,
    sender_role: SenderRole,
    mentor_id: String,
    user_id: String,
    message: Option<String>,
    kind: Option<MessageKind>,
    booking: Option<BookingPayload>,
    timestamp: Option<i64>,
    request_id: Option<String>,
) {
    let parsed = UserId::new(mentor_id).and_then(|m| Ok((m, UserId::new(user_id)?)));
    let (mentor_id, user_id) = match parsed {
        Ok(ids) => ids,
        Err(e) => {
            send_event(tx, &error_ack(event_name, request_id, &e.into()));
            return;
        }
    };

    let input = SendMessageInput {
        mentor_id,
        user_id,
        sender_role,
        kind: kind.unwrap_or(MessageKind::Text),
        text: message,
        booking: booking.map(booking_payload_to_draft),
        timestamp,
    };

    match state.send_message_usecase.execute(input).await {
        Ok(outcome) => {
            let event = ServerEvent::ReceiveMessage {
                message: message_to_dto(&outcome.message, outcome.booking.as_ref()),
            };
            state
                .message_pusher
                .broadcast_room(&outcome.message.room_id, &to_json(&event))
                .await;

            if !outcome.delivered {
                // No push-notification fallback: the message waits in the
                // store until the next history fetch / reconnect
                let queued = ServerEvent::MessageQueued {
                    message_id: outcome.message.id.to_string(),
                    recipient: outcome.message.recipient_id.as_str().to_string(),
                };
                send_event(tx, &queued);
            }
            send_event(tx, &ok_ack(event_name, request_id));
        }
        Err(e) => {
            tracing::warn!("{} rejected: {}", event_name, e);
            send_event(tx, &error_ack(event_name, request_id, &e));
        }
    }
}

/// Relay a typing signal to the other room members (ephemeral, not persisted).
async fn relay_typing(
    state: &Arc<AppState>,
    tx: &PusherChannel,
    room_id: String,
    user_id: String,
    is_typing: bool,
) {
    let event_name = if is_typing { "typing_start" } else { "typing_stop" };
    let parsed = RoomId::parse(&room_id).and_then(|r| Ok((r, UserId::new(user_id)?)));
    let (room_id, user_id) = match parsed {
        Ok(ids) => ids,
        Err(e) => {
            send_event(tx, &error_ack(event_name, None, &e.into()));
            return;
        }
    };

    let event = ServerEvent::UserTyping {
        user_id: user_id.as_str().to_string(),
        is_typing,
    };
    state
        .message_pusher
        .broadcast_room_excluding(&room_id, &user_id, &to_json(&event))
        .await;
    send_event(tx, &ok_ack(event_name, None));
}

fn to_json(event: &ServerEvent) -> String {
    serde_json::to_string(event).unwrap()
}

fn send_event(tx: &PusherChannel, event: &ServerEvent) {
    // A failed send means the connection is already closing; nothing to do
    let _ = tx.send(to_json(event));
}

fn ok_ack(event: &'static str, request_id: Option<String>) -> ServerEvent {
    ServerEvent::Ack {
        request_id,
        event: event.to_string(),
        ok: true,
        error: None,
        error_kind: None,
    }
}

fn error_ack(event: &'static str, request_id: Option<String>, error: &UseCaseError) -> ServerEvent {
    ServerEvent::Ack {
        request_id,
        event: event.to_string(),
        ok: false,
        error: Some(error.to_string()),
        error_kind: Some(error_kind_str(error.kind()).to_string()),
    }
}

fn plain_error_ack(
    event: &str,
    request_id: Option<String>,
    kind: &str,
    message: &str,
) -> ServerEvent {
    ServerEvent::Ack {
        request_id,
        event: event.to_string(),
        ok: false,
        error: Some(message.to_string()),
        error_kind: Some(kind.to_string()),
    }
}

fn error_kind_str(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::Unauthorized => "unauthorized",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Internal => "internal",
    }
}
