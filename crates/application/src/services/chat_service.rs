//! 消息引擎与房间成员协议
//!
//! 每条消息的状态机：created → sent → delivered。
//! 发送流程固定为两段式：以 `sent` 状态落库并广播一次，随后立即
//! 落库 `delivered` 并向同一房间广播同一条消息的更新副本。
//! 两次广播是协议的一部分，不是重复发送。

use std::sync::Arc;

use domain::{
    ChatMessage, CommunityId, ConnectionId, CourseDirectory, CourseId, MessageRepository,
    MessageStatus, Notification, NotificationKind, PrivateChatId, PurchaseLedger, RoomId,
    UserDirectory, UserId,
};
use domain::DomainError;
use tracing::debug;

use crate::dto::{PrivateChatSummary, PrivateMessagePayload};
use crate::error::ApplicationError;
use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;
use crate::router::MessageRouter;
use crate::services::notification_service::NotificationService;

/// 客户端提交的消息体
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

pub struct ChatServiceDependencies {
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub messages: Arc<dyn MessageRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub courses: Arc<dyn CourseDirectory>,
    pub purchases: Arc<dyn PurchaseLedger>,
    pub notifications: Arc<NotificationService>,
    /// 加入房间时回放的历史条数
    pub history_limit: u32,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 用户上线：绑定连接、加入收件箱房间、推送私聊列表
    pub async fn join_user(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
    ) -> Result<(), ApplicationError> {
        self.deps.registry.bind_user(connection_id, user_id).await;
        self.deps
            .registry
            .join_room(connection_id, RoomId::inbox(user_id))
            .await;

        let chats = self.build_private_chats(user_id).await?;
        self.deps
            .router
            .send_to_connection(connection_id, ServerEvent::PrivateChats { chats })
            .await;
        Ok(())
    }

    /// 连接握手阶段携带身份时的注册（不触发私聊列表推送）
    pub async fn register_on_connect(&self, connection_id: ConnectionId, user_id: UserId) {
        self.deps.registry.bind_user(connection_id, user_id).await;
        self.deps
            .registry
            .join_room(connection_id, RoomId::inbox(user_id))
            .await;
    }

    /// 加入任意房间并回发确认
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), ApplicationError> {
        if room_id.as_str().is_empty() {
            return Err(DomainError::validation_error("room_id", "cannot be empty").into());
        }
        self.deps
            .registry
            .join_room(connection_id, room_id.clone())
            .await;
        self.deps
            .router
            .send_to_connection(connection_id, ServerEvent::JoinedRoom { room_id })
            .await;
        Ok(())
    }

    /// 离开房间；无确认事件
    pub async fn leave_room(&self, connection_id: ConnectionId, room_id: RoomId) {
        self.deps.registry.leave_room(connection_id, &room_id).await;
    }

    /// 加入社区房间，回放最近的历史快照（升序，一次性）
    pub async fn join_community(
        &self,
        connection_id: ConnectionId,
        community_id: CommunityId,
    ) -> Result<(), ApplicationError> {
        self.deps
            .registry
            .join_room(connection_id, RoomId::community(community_id))
            .await;

        let history = self
            .deps
            .messages
            .recent_by_community(community_id, self.deps.history_limit)
            .await?;
        self.deps
            .router
            .send_to_connection(connection_id, ServerEvent::MessageHistory(history))
            .await;
        Ok(())
    }

    /// 加入私聊房间，回放最近的历史快照
    pub async fn join_private_chat(
        &self,
        connection_id: ConnectionId,
        course_id: CourseId,
        student_id: UserId,
        tutor_id: UserId,
    ) -> Result<(), ApplicationError> {
        let key = PrivateChatId::derive(course_id, student_id, tutor_id);
        self.deps
            .registry
            .join_room(connection_id, key.room_id())
            .await;

        let history = self
            .deps
            .messages
            .recent_by_private_chat(&key, self.deps.history_limit)
            .await?;
        self.deps
            .router
            .send_to_connection(connection_id, ServerEvent::PrivateMessageHistory(history))
            .await;
        Ok(())
    }

    /// 社区消息发送：两段式落库+广播
    pub async fn send_community_message(
        &self,
        community_id: CommunityId,
        incoming: IncomingMessage,
        image_url: Option<String>,
    ) -> Result<(), ApplicationError> {
        let message = ChatMessage::community(
            community_id,
            incoming.sender.unwrap_or_default(),
            incoming.content.unwrap_or_default(),
            incoming.timestamp.unwrap_or_default(),
            image_url,
        )?;

        let mut stored = self.deps.messages.create(&message).await?;
        let room = RoomId::community(community_id);
        self.deps
            .router
            .send_to_room(&room, ServerEvent::ReceiveMessage(stored.clone()))
            .await;

        self.deps
            .messages
            .set_status(stored.id, MessageStatus::Delivered)
            .await?;
        stored.mark_delivered();
        self.deps
            .router
            .send_to_room(&room, ServerEvent::ReceiveMessage(stored))
            .await;
        Ok(())
    }

    /// 私聊消息发送：两段式落库+广播，附带课程/学生显示信息，
    /// 并向对端投递一条聊天通知、向导师收件箱发刷新信号
    #[allow(clippy::too_many_arguments)]
    pub async fn send_private_message(
        &self,
        connection_id: ConnectionId,
        course_id: CourseId,
        student_id: UserId,
        tutor_id: UserId,
        incoming: IncomingMessage,
        image_url: Option<String>,
        explicit_sender: Option<UserId>,
    ) -> Result<(), ApplicationError> {
        let key = PrivateChatId::derive(course_id, student_id, tutor_id);

        let course = self
            .deps
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("course", course_id.to_string())
            })?;
        let student = self
            .deps
            .users
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("student", student_id.to_string())
            })?;

        let message = ChatMessage::private(
            key,
            incoming.sender.unwrap_or_default(),
            incoming.content.unwrap_or_default(),
            incoming.timestamp.unwrap_or_default(),
            image_url,
        )?;

        let mut stored = self.deps.messages.create(&message).await?;
        let room = key.room_id();
        self.deps
            .router
            .send_to_room(
                &room,
                ServerEvent::ReceivePrivateMessage(PrivateMessagePayload {
                    message: stored.clone(),
                    course_title: course.title.clone(),
                    student_name: student.name.clone(),
                }),
            )
            .await;

        self.deps
            .messages
            .set_status(stored.id, MessageStatus::Delivered)
            .await?;
        stored.mark_delivered();
        let sender_name = stored.sender.clone();
        self.deps
            .router
            .send_to_room(
                &room,
                ServerEvent::ReceivePrivateMessage(PrivateMessagePayload {
                    message: stored,
                    course_title: course.title,
                    student_name: student.name,
                }),
            )
            .await;

        // 对端：学生发给导师，导师发给学生；无法识别时默认通知导师
        let sender_user = match explicit_sender {
            Some(user) => Some(user),
            None => self.deps.registry.user_of(connection_id).await,
        };
        let recipient = match sender_user {
            Some(user) if user == tutor_id => student_id,
            _ => tutor_id,
        };

        self.deps
            .notifications
            .notify(Notification::private_context(
                recipient,
                NotificationKind::ChatMessage,
                format!("{} sent you a message", sender_name),
                course_id,
                student_id,
                tutor_id,
                self.deps.notifications.now(),
            ))
            .await?;

        // 导师侧私聊列表的自刷新信号
        self.deps
            .router
            .send_to_room(
                &RoomId::inbox(tutor_id),
                ServerEvent::FetchPrivateChats { tutor_id },
            )
            .await;
        Ok(())
    }

    /// 重建导师的私聊列表并推送给请求连接
    pub async fn fetch_private_chats(
        &self,
        connection_id: ConnectionId,
        tutor_id: UserId,
    ) -> Result<(), ApplicationError> {
        let chats = self.build_private_chats(tutor_id).await?;
        self.deps
            .router
            .send_to_connection(connection_id, ServerEvent::PrivateChats { chats })
            .await;
        Ok(())
    }

    /// 私聊列表重建
    ///
    /// 没有独立的"会话"集合，列表每次都全量推导：
    /// 1. 按线程取最新消息，解析复合键并解析课程/学生（失败则跳过）；
    /// 2. 对导师名下已付费但尚无消息的学生合成零消息条目；
    /// 3. 合并后按最新消息时间降序排序，无消息的线程排在最后。
    ///
    /// 复杂度 O(消息数 + 购买数)，不要在紧循环里调用。
    async fn build_private_chats(
        &self,
        tutor_id: UserId,
    ) -> Result<Vec<PrivateChatSummary>, ApplicationError> {
        let mut entries = Vec::new();
        let mut seen = std::collections::HashSet::new();

        let latest = self.deps.messages.latest_per_private_chat(tutor_id).await?;
        for message in latest {
            let Some(key) = message.private_chat_id else {
                continue;
            };
            let Some(course) = self.deps.courses.find_by_id(key.course_id).await? else {
                debug!(course_id = %key.course_id, "私聊线程课程缺失，跳过");
                continue;
            };
            let Some(student) = self.deps.users.find_by_id(key.student_id).await? else {
                debug!(student_id = %key.student_id, "私聊线程学生缺失，跳过");
                continue;
            };

            let unread_count = self
                .deps
                .notifications
                .unread_chat_messages(tutor_id, key.course_id, key.student_id)
                .await?;

            seen.insert((key.course_id, key.student_id));
            entries.push(PrivateChatSummary {
                private_chat_id: key,
                course_id: key.course_id,
                course_title: course.title,
                student_id: key.student_id,
                student_name: student.name,
                latest_message: Some(message),
                unread_count,
            });
        }

        // 已付费但还没有消息往来的学生也要出现在列表里
        let purchases = self.deps.purchases.purchases_by_tutor(tutor_id).await?;
        for purchase in purchases {
            if seen.contains(&(purchase.course_id, purchase.student_id)) {
                continue;
            }
            seen.insert((purchase.course_id, purchase.student_id));

            let Some(course) = self.deps.courses.find_by_id(purchase.course_id).await? else {
                continue;
            };
            let Some(student) = self.deps.users.find_by_id(purchase.student_id).await? else {
                continue;
            };

            let key = PrivateChatId::derive(purchase.course_id, purchase.student_id, tutor_id);
            entries.push(PrivateChatSummary {
                private_chat_id: key,
                course_id: purchase.course_id,
                course_title: course.title,
                student_id: purchase.student_id,
                student_name: student.name,
                latest_message: None,
                unread_count: 0,
            });
        }

        // 无消息的线程按纪元零时间处理，自然排到最后
        entries.sort_by(|a, b| {
            let ts_a = a
                .latest_message
                .as_ref()
                .map(|m| m.timestamp.as_str())
                .unwrap_or("");
            let ts_b = b
                .latest_message
                .as_ref()
                .map(|m| m.timestamp.as_str())
                .unwrap_or("");
            ts_b.cmp(ts_a)
        });

        Ok(entries)
    }
}
