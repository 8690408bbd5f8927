//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{
    approve_member, control_timer, create_room, create_task, get_my_heatmap, get_my_stats,
    get_room_chat, get_room_detail, get_room_tasks, get_rooms, health_check, join_room,
    log_session, update_task,
};
pub use websocket::websocket_handler;
