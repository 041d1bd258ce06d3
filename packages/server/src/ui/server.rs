//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        http::{
            create_review, delete_conversation, delete_notification, get_conversations,
            get_history, get_unread, health_check, list_notifications,
            mark_all_notifications_read, mark_notification_read, mark_read,
        },
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the axum router for the realtime gateway and the HTTP API.
///
/// Shared with the integration tests so they exercise the exact routing
/// the binary serves.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/messages/{mentor_id}/{user_id}", get(get_history))
        .route("/api/messages/mark-read", post(mark_read))
        .route(
            "/api/messages/conversations/{id}",
            get(get_conversations).delete(delete_conversation),
        )
        .route("/api/messages/unread/{user_id}", get(get_unread))
        .route(
            "/api/notifications/{id}",
            get(list_notifications).delete(delete_notification),
        )
        .route("/api/notifications/{id}/read", put(mark_notification_read))
        .route(
            "/api/notifications/read-all",
            put(mark_all_notifications_read),
        )
        .route("/api/reviews", post(create_review))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Realtime messaging and booking negotiation server
///
/// This struct encapsulates the server configuration and provides methods
/// to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run the server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = build_router(self.state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Mentorship chat server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
