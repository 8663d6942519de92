//! 连接注册表
//!
//! "用户 X 现在是否可达、在哪个连接上、加入了哪些房间"的唯一事实来源。
//! 纯进程内状态，不做任何持久化；作为注入的服务对象存在，
//! 测试可以为每个用例创建独立实例。

use std::collections::{HashMap, HashSet};

use domain::{ConnectionId, RoomId, UserId};
use tokio::sync::RwLock;
use tracing::debug;

/// 内存连接注册表
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// 用户到连接的映射（每个用户至多一个活跃连接，后加入者获胜）
    user_sockets: RwLock<HashMap<UserId, ConnectionId>>,
    /// 连接到用户的反向映射
    socket_users: RwLock<HashMap<ConnectionId, UserId>>,
    /// 连接当前加入的房间集合
    socket_rooms: RwLock<HashMap<ConnectionId, HashSet<RoomId>>>,
    /// 房间到连接的映射
    room_members: RwLock<HashMap<RoomId, HashSet<ConnectionId>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新连接建立时调用，为其分配空的房间集合
    pub async fn on_connect(&self, connection_id: ConnectionId) {
        self.socket_rooms
            .write()
            .await
            .entry(connection_id)
            .or_default();
        debug!(connection_id = %connection_id, "连接已注册");
    }

    /// 将连接绑定到用户，覆盖该用户之前的任何连接映射
    ///
    /// 旧连接的房间成员关系保持不变，只是不再通过
    /// `resolve_socket` 可达。
    pub async fn bind_user(&self, connection_id: ConnectionId, user_id: UserId) {
        self.user_sockets
            .write()
            .await
            .insert(user_id, connection_id);
        self.socket_users
            .write()
            .await
            .insert(connection_id, user_id);
        debug!(user_id = %user_id, connection_id = %connection_id, "用户已绑定连接");
    }

    /// 加入房间
    pub async fn join_room(&self, connection_id: ConnectionId, room_id: RoomId) {
        self.socket_rooms
            .write()
            .await
            .entry(connection_id)
            .or_default()
            .insert(room_id.clone());
        self.room_members
            .write()
            .await
            .entry(room_id)
            .or_default()
            .insert(connection_id);
    }

    /// 离开房间
    pub async fn leave_room(&self, connection_id: ConnectionId, room_id: &RoomId) {
        if let Some(rooms) = self.socket_rooms.write().await.get_mut(&connection_id) {
            rooms.remove(room_id);
        }
        let mut members = self.room_members.write().await;
        if let Some(set) = members.get_mut(room_id) {
            set.remove(&connection_id);
            if set.is_empty() {
                members.remove(room_id);
            }
        }
    }

    /// 连接断开时的全部清理，可重复调用
    ///
    /// 只有当用户映射仍然指向该连接时才移除映射：
    /// 旧连接迟到的断开事件不能清掉新连接的可达性。
    pub async fn on_disconnect(&self, connection_id: ConnectionId) {
        if let Some(user_id) = self.socket_users.write().await.remove(&connection_id) {
            let mut user_sockets = self.user_sockets.write().await;
            if user_sockets.get(&user_id) == Some(&connection_id) {
                user_sockets.remove(&user_id);
            }
        }

        let rooms = self.socket_rooms.write().await.remove(&connection_id);
        if let Some(rooms) = rooms {
            let mut members = self.room_members.write().await;
            for room_id in rooms {
                if let Some(set) = members.get_mut(&room_id) {
                    set.remove(&connection_id);
                    if set.is_empty() {
                        members.remove(&room_id);
                    }
                }
            }
        }
        debug!(connection_id = %connection_id, "连接已清理");
    }

    /// 用户当前可达的连接
    pub async fn resolve_socket(&self, user_id: UserId) -> Option<ConnectionId> {
        self.user_sockets.read().await.get(&user_id).copied()
    }

    /// 连接绑定的用户
    pub async fn user_of(&self, connection_id: ConnectionId) -> Option<UserId> {
        self.socket_users.read().await.get(&connection_id).copied()
    }

    /// 连接当前加入的房间集合
    pub async fn rooms_of(&self, connection_id: ConnectionId) -> HashSet<RoomId> {
        self.socket_rooms
            .read()
            .await
            .get(&connection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 房间当前的成员连接
    pub async fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.room_members
            .read()
            .await
            .get(room_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}
