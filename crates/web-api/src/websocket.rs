//! WebSocket 连接处理
//!
//! 每个客户端一条长连接。连接升级时可携带 `userId` 查询参数提前
//! 建立身份；显式身份仍通过 `join_user` 事件建立。发送与接收拆成
//! 两个任务，所有对 socket 的写操作都经由路由器注册的通道。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use application::ServerEvent;
use domain::{ConnectionId, UserId};

use crate::dispatch::dispatch;
use crate::protocol::ClientEvent;
use crate::state::AppState;

/// WebSocket 连接查询参数
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// 握手阶段携带的用户身份（可选）
    #[serde(default, rename = "userId")]
    pub user_id: Option<UserId>,
}

/// 处理 WebSocket 连接升级
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.user_id))
}

/// 单条连接的主循环
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Option<UserId>) {
    let connection_id = ConnectionId::generate();
    state.registry.on_connect(connection_id).await;
    info!(connection_id = %connection_id, "WebSocket 连接已建立");

    // 握手阶段携带身份的客户端立即注册可达性
    if let Some(user_id) = user_id {
        state.chat.register_on_connect(connection_id, user_id).await;
    }

    let (mut sender, mut receiver) = socket.split();

    // 创建消息通道并注册到路由器
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.router.register_sender(connection_id, tx).await;

    // 发送任务：统一处理所有出站事件的序列化和写入
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(WsMessage::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "出站事件序列化失败");
                }
            }
        }
        debug!("WebSocket发送任务结束");
    });

    // 接收任务：解析入站事件并分发
    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => dispatch(&recv_state, connection_id, event).await,
                    Err(err) => {
                        debug!(connection_id = %connection_id, error = %err, "入站帧无法解析");
                        recv_state
                            .router
                            .send_to_connection(
                                connection_id,
                                ServerEvent::error("unrecognized event or malformed payload"),
                            )
                            .await;
                    }
                },
                WsMessage::Close(_) => {
                    debug!(connection_id = %connection_id, "客户端关闭连接");
                    break;
                }
                // ping 由 axum 自动回应；二进制帧不在协议内
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Binary(_) => {}
            }
        }
        debug!("WebSocket接收任务结束");
    });

    // 任一任务结束即视为连接生命周期结束
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    // 断开清理：注销发送通道、清理注册表；重复清理是安全的
    state.router.unregister_sender(connection_id).await;
    state.registry.on_disconnect(connection_id).await;
    info!(connection_id = %connection_id, "WebSocket连接已断开，注册表已清理");
}
