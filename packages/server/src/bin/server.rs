//! Focus room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin focusroom-server
//! cargo run --bin focusroom-server -- --host 0.0.0.0 --port 3000 --timer-control owner-only
//! ```

use std::{sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use focusroom_server::{
    domain::{ConnectionRegistry, RoomPolicy, TimerControlPolicy},
    infrastructure::{
        connection_registry::WebSocketConnectionRegistry,
        password_hasher::Argon2PasswordHasher,
        repository::{InMemoryRoomRepository, InMemoryUserStatsRepository},
    },
    ui::{AppState, Server, state::Dependencies},
    usecase::PurgeExpiredRoomsUseCase,
};
use focusroom_shared::{logger::setup_logger, time::SystemClock};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimerControl {
    /// Only the room owner may start, pause, stop or reset the timer
    OwnerOnly,
    /// Any room member may control the timer
    AnyMember,
}

impl From<TimerControl> for TimerControlPolicy {
    fn from(value: TimerControl) -> Self {
        match value {
            TimerControl::OwnerOnly => TimerControlPolicy::OwnerOnly,
            TimerControl::AnyMember => TimerControlPolicy::AnyMember,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "focusroom-server")]
#[command(about = "Shared focus room server (HTTP + WebSocket)", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "FOCUSROOM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "FOCUSROOM_PORT", default_value = "8080")]
    port: u16,

    /// Who may control a room's timer
    #[arg(long, env = "FOCUSROOM_TIMER_CONTROL", value_enum, default_value = "any-member")]
    timer_control: TimerControl,

    /// Hours until a room expires
    #[arg(long, env = "FOCUSROOM_ROOM_TTL_HOURS", default_value = "24")]
    room_ttl_hours: u32,

    /// Timer length used when a start names no duration and none is stored
    #[arg(long, env = "FOCUSROOM_DEFAULT_TIMER_MINUTES", default_value = "25")]
    default_timer_minutes: u32,

    /// Newest chat messages kept per room
    #[arg(long, env = "FOCUSROOM_CHAT_HISTORY_LIMIT", default_value = "500")]
    chat_history_limit: usize,

    /// Seconds between expired-room sweeps
    #[arg(long, env = "FOCUSROOM_SWEEP_INTERVAL_SECS", default_value = "60")]
    sweep_interval_secs: u64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "FOCUSROOM_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn policy(&self) -> RoomPolicy {
        RoomPolicy {
            timer_control: self.timer_control.into(),
            room_ttl_millis: i64::from(self.room_ttl_hours) * 60 * 60 * 1000,
            default_timer_minutes: self.default_timer_minutes,
            chat_history_limit: self.chat_history_limit,
        }
    }
}

/// Periodically delete expired rooms and close their connections.
fn spawn_expiry_sweeper(
    usecase: Arc<PurgeExpiredRoomsUseCase>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match usecase.execute().await {
                Ok(purged) if !purged.is_empty() => {
                    tracing::info!("Purged {} expired room(s)", purged.len());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Expired room sweep failed: {}", e),
            }
        }
    })
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let policy = args.policy();
    tracing::info!(
        "Room policy: timer control {:?}, ttl {}h, default timer {} min, chat history {}",
        policy.timer_control,
        args.room_ttl_hours,
        policy.default_timer_minutes,
        policy.chat_history_limit
    );

    // Initialize dependencies in order:
    // 1. Clock / Repositories / ConnectionRegistry / PasswordHasher
    // 2. UseCases (AppState)
    // 3. Background sweeper
    // 4. Server
    let clock = Arc::new(SystemClock);
    let registry = Arc::new(WebSocketConnectionRegistry::new());
    let state = Arc::new(AppState::new(Dependencies {
        room_repository: Arc::new(InMemoryRoomRepository::new(clock.clone())),
        stats_repository: Arc::new(InMemoryUserStatsRepository::new()),
        registry: registry.clone(),
        password_hasher: Arc::new(Argon2PasswordHasher::new()),
        clock,
        policy,
    }));

    let sweeper = spawn_expiry_sweeper(
        state.purge_expired_rooms_usecase.clone(),
        Duration::from_secs(args.sweep_interval_secs.max(1)),
    );

    let server = Server::new(state);
    let result = server.run(args.host, args.port).await;

    sweeper.abort();
    registry.shutdown().await;

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
