//! Server state shared by the websocket gateway and the HTTP API.

use std::sync::Arc;

use crate::domain::MessagePusher;
use crate::usecase::{
    DeleteConversationUseCase, DisconnectUseCase, GetChatHistoryUseCase,
    GetConversationsUseCase, JoinChatUseCase, MarkMessagesReadUseCase, NotificationsUseCase,
    RegisterUserUseCase, SendMessageUseCase, UpdateBookingStatusUseCase,
};

/// Shared application state
///
/// Both delivery paths (websocket events and REST) resolve to the same
/// usecase instances, so e.g. mark-as-read converges on the identical
/// mutation regardless of which path the client used last.
pub struct AppState {
    /// RegisterUserUseCase（ユーザー登録のユースケース）
    pub register_user_usecase: Arc<RegisterUserUseCase>,
    /// DisconnectUseCase（切断処理のユースケース）
    pub disconnect_usecase: Arc<DisconnectUseCase>,
    /// JoinChatUseCase（チャット参加のユースケース）
    pub join_chat_usecase: Arc<JoinChatUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// UpdateBookingStatusUseCase（ブッキング状態更新のユースケース）
    pub update_booking_status_usecase: Arc<UpdateBookingStatusUseCase>,
    /// MarkMessagesReadUseCase（既読化のユースケース、REST と WS で共有）
    pub mark_messages_read_usecase: Arc<MarkMessagesReadUseCase>,
    /// GetChatHistoryUseCase（履歴取得のユースケース）
    pub get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    /// GetConversationsUseCase（会話一覧のユースケース）
    pub get_conversations_usecase: Arc<GetConversationsUseCase>,
    /// DeleteConversationUseCase（会話削除のユースケース）
    pub delete_conversation_usecase: Arc<DeleteConversationUseCase>,
    /// NotificationsUseCase（通知管理のユースケース）
    pub notifications_usecase: Arc<NotificationsUseCase>,
    /// MessagePusher（ブロードキャストと個人チャンネル配信）
    pub message_pusher: Arc<dyn MessagePusher>,
}
