//! UseCase 層
//!
//! クライアントのイベント／リクエストをドメイン操作に翻訳します。
//! 各ユースケースは Repository と MessagePusher の trait にのみ依存し、
//! 具体的な実装（SQLite、インメモリ、WebSocket）を知りません。
//!
//! ブロードキャストするペイロード（DTO）の構築と配信は UI 層の責務です。
//! ユースケースは状態を変更し、配信に必要な結果（作成されたメッセージ、
//! 遷移後のブッキング、副作用）を返します。

mod delete_conversation;
mod error;
mod get_chat_history;
mod get_conversations;
mod join_chat;
mod mark_messages_read;
mod notifications;
mod register_user;
mod send_message;
mod update_booking_status;

pub use delete_conversation::DeleteConversationUseCase;
pub use error::{ErrorKind, UseCaseError};
pub use get_chat_history::{
    ChatHistory, DEFAULT_HISTORY_LIMIT, GetChatHistoryUseCase, HistoryEntry,
};
pub use get_conversations::GetConversationsUseCase;
pub use join_chat::JoinChatUseCase;
pub use mark_messages_read::MarkMessagesReadUseCase;
pub use notifications::{NotificationsUseCase, ReviewNotificationOutcome};
pub use register_user::{DisconnectUseCase, RegisterUserUseCase};
pub use send_message::{SendMessageInput, SendMessageUseCase, SendOutcome};
pub use update_booking_status::{
    BookingUpdateOutcome, CompletionSideEffects, UpdateBookingStatusUseCase,
};
