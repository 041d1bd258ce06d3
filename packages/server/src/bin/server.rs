//! Realtime mentorship chat server.
//!
//! Persists messages, bookings and notifications to SQLite and relays
//! chat / booking events over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin shitei-server
//! cargo run --bin shitei-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin shitei-server -- --ephemeral
//! ```

use std::sync::Arc;

use clap::Parser;
use shitei_server::{
    domain::{BookingRepository, MessageRepository, NotificationRepository},
    infrastructure::{
        database,
        message_pusher::WebSocketMessagePusher,
        repository::{
            InMemoryBookingRepository, InMemoryMessageRepository,
            InMemoryNotificationRepository, SqliteBookingRepository, SqliteMessageRepository,
            SqliteNotificationRepository,
        },
    },
    ui::{Server, state::AppState},
    usecase::{
        DeleteConversationUseCase, DisconnectUseCase, GetChatHistoryUseCase,
        GetConversationsUseCase, JoinChatUseCase, MarkMessagesReadUseCase,
        NotificationsUseCase, RegisterUserUseCase, SendMessageUseCase,
        UpdateBookingStatusUseCase,
    },
};
use shitei_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "shitei-server")]
#[command(about = "Realtime mentorship chat and booking server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// SQLite connection string
    #[arg(long, default_value = "sqlite:shitei.db?mode=rwc")]
    database_url: String,

    /// Use in-memory repositories instead of SQLite (state is lost on exit)
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. UseCases
    // 4. AppState
    // 5. Server

    // 1. Create repositories (SQLite by default, in-memory with --ephemeral)
    let (messages, bookings, notifications): (
        Arc<dyn MessageRepository>,
        Arc<dyn BookingRepository>,
        Arc<dyn NotificationRepository>,
    ) = if args.ephemeral {
        tracing::warn!("Running with in-memory repositories; state is lost on exit");
        (
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(InMemoryBookingRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
        )
    } else {
        let pool = match database::connect(&args.database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to open database '{}': {}", args.database_url, e);
                std::process::exit(1);
            }
        };
        tracing::info!("Connected to database '{}'", args.database_url);
        (
            Arc::new(SqliteMessageRepository::new(pool.clone())),
            Arc::new(SqliteBookingRepository::new(pool.clone())),
            Arc::new(SqliteNotificationRepository::new(pool)),
        )
    };

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create UseCases
    let get_chat_history_usecase = Arc::new(GetChatHistoryUseCase::new(
        messages.clone(),
        bookings.clone(),
    ));
    let app_state = AppState {
        register_user_usecase: Arc::new(RegisterUserUseCase::new(message_pusher.clone())),
        disconnect_usecase: Arc::new(DisconnectUseCase::new(message_pusher.clone())),
        join_chat_usecase: Arc::new(JoinChatUseCase::new(
            get_chat_history_usecase.clone(),
            message_pusher.clone(),
        )),
        send_message_usecase: Arc::new(SendMessageUseCase::new(
            messages.clone(),
            bookings.clone(),
            message_pusher.clone(),
        )),
        update_booking_status_usecase: Arc::new(UpdateBookingStatusUseCase::new(
            messages.clone(),
            bookings.clone(),
            notifications.clone(),
            message_pusher.clone(),
        )),
        mark_messages_read_usecase: Arc::new(MarkMessagesReadUseCase::new(messages.clone())),
        get_chat_history_usecase,
        get_conversations_usecase: Arc::new(GetConversationsUseCase::new(messages.clone())),
        delete_conversation_usecase: Arc::new(DeleteConversationUseCase::new(
            messages,
            bookings,
        )),
        notifications_usecase: Arc::new(NotificationsUseCase::new(
            notifications,
            message_pusher.clone(),
        )),
        message_pusher,
    };

    // 4. Create and run the server
    let server = Server::new(Arc::new(app_state));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
