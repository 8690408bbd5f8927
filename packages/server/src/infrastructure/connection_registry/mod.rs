//! ConnectionRegistry の実装
//!
//! - `websocket`: WebSocket の送信チャネルを保持する実装
//!
//! プロセスをまたいだファンアウト（pub/sub）は扱いません。

pub mod websocket;

pub use websocket::WebSocketConnectionRegistry;
