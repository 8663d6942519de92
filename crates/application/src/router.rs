//! 消息路由器
//!
//! 持有每个连接的发送通道，并基于连接注册表做按用户/按房间的扇出。
//! 向已关闭通道的发送会被静默丢弃：断开连接瞬间仍在途的广播
//! 由传输层自然吞掉，不是错误。

use std::collections::HashMap;
use std::sync::Arc;

use domain::{ConnectionId, RoomId, UserId};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;

/// 连接级消息路由器
pub struct MessageRouter {
    /// 连接发送器映射
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
    /// 房间/用户成员关系来源
    registry: Arc<ConnectionRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            registry,
        }
    }

    /// 注册连接发送器
    pub async fn register_sender(
        &self,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.senders.write().await.insert(connection_id, sender);
    }

    /// 注销连接发送器
    pub async fn unregister_sender(&self, connection_id: ConnectionId) {
        self.senders.write().await.remove(&connection_id);
    }

    /// 发送事件到单个连接
    pub async fn send_to_connection(&self, connection_id: ConnectionId, event: ServerEvent) {
        let senders = self.senders.read().await;
        match senders.get(&connection_id) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    debug!(connection_id = %connection_id, "连接已关闭，丢弃事件");
                }
            }
            None => {
                debug!(connection_id = %connection_id, "连接不存在，丢弃事件");
            }
        }
    }

    /// 发送事件到用户当前可达的连接；返回是否找到了连接
    pub async fn send_to_user(&self, user_id: UserId, event: ServerEvent) -> bool {
        match self.registry.resolve_socket(user_id).await {
            Some(connection_id) => {
                self.send_to_connection(connection_id, event).await;
                true
            }
            None => false,
        }
    }

    /// 广播事件到房间的全部成员
    pub async fn send_to_room(&self, room_id: &RoomId, event: ServerEvent) {
        let members = self.registry.members_of(room_id).await;
        let senders = self.senders.read().await;
        for connection_id in members {
            if let Some(sender) = senders.get(&connection_id) {
                if sender.send(event.clone()).is_err() {
                    debug!(connection_id = %connection_id, room_id = %room_id, "广播目标已关闭");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn setup() -> (Arc<ConnectionRegistry>, MessageRouter) {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = MessageRouter::new(registry.clone());
        (registry, router)
    }

    #[tokio::test]
    async fn routes_to_room_members_only() {
        let (registry, router) = setup().await;
        let room = RoomId::new("r");

        let inside = ConnectionId::generate();
        let outside = ConnectionId::generate();
        registry.on_connect(inside).await;
        registry.on_connect(outside).await;
        registry.join_room(inside, room.clone()).await;

        let (tx_in, mut rx_in) = mpsc::unbounded_channel();
        let (tx_out, mut rx_out) = mpsc::unbounded_channel();
        router.register_sender(inside, tx_in).await;
        router.register_sender(outside, tx_out).await;

        router.send_to_room(&room, ServerEvent::error("ping")).await;

        assert!(rx_in.try_recv().is_ok());
        assert!(rx_out.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_user_reports_reachability() {
        let (registry, router) = setup().await;
        let user = UserId::new(Uuid::new_v4());
        let conn = ConnectionId::generate();

        assert!(!router.send_to_user(user, ServerEvent::error("x")).await);

        registry.on_connect(conn).await;
        registry.bind_user(conn, user).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        router.register_sender(conn, tx).await;

        assert!(router.send_to_user(user, ServerEvent::error("y")).await);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn dropped_receiver_is_silently_ignored() {
        let (registry, router) = setup().await;
        let conn = ConnectionId::generate();
        registry.on_connect(conn).await;

        let (tx, rx) = mpsc::unbounded_channel();
        router.register_sender(conn, tx).await;
        drop(rx);

        // 不应恐慌
        router.send_to_connection(conn, ServerEvent::error("z")).await;
    }
}
