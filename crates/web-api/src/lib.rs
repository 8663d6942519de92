//! Web API 层。
//!
//! 提供 Axum 路由，将 WebSocket 事件委托给应用层的信令服务。

mod dispatch;
mod protocol;
mod routes;
mod state;
mod websocket;

pub use protocol::ClientEvent;
pub use routes::router;
pub use state::AppState;
