//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, patch, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        approve_member, control_timer, create_room, create_task, get_my_heatmap, get_my_stats,
        get_room_chat, get_room_detail, get_room_tasks, get_rooms, health_check, join_room,
        log_session, update_task, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Focus room server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(Arc::new(AppState::new(dependencies)));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Build the router with every HTTP and WebSocket route.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/api/ws/room/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/rooms/{room_id}/join", post(join_room))
            .route("/api/rooms/{room_id}/approve", post(approve_member))
            .route("/api/rooms/{room_id}/chat", get(get_room_chat))
            .route(
                "/api/rooms/{room_id}/tasks",
                get(get_room_tasks).post(create_task),
            )
            .route("/api/rooms/{room_id}/tasks/{task_id}", patch(update_task))
            .route("/api/rooms/{room_id}/timer", post(control_timer))
            .route("/api/rooms/{room_id}/log_session", post(log_session))
            .route("/api/users/me/stats", get(get_my_stats))
            .route("/api/users/me/heatmap", get(get_my_heatmap))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        tracing::info!("Focus room server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/api/ws/room/{{room_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
