//! 通知分发
//!
//! 定向分发：持久化一条记录，接收者在线则推送到其收件箱房间；
//! 离线则只留记录，由 REST 层事后拉取，信令层不排队不重试。
//! 社区广播：成员集由已完成购买推导，排除发送者，逐人落库，
//! 外加一次对社区房间的轻量提示（两层扇出）。

use std::sync::Arc;

use domain::{
    CommunityId, CourseId, Notification, NotificationId, NotificationRepository, PurchaseLedger,
    RoomId, UserId,
};
use tracing::debug;

use crate::clock::Clock;
use crate::dto::CommunityPing;
use crate::error::ApplicationError;
use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;
use crate::router::MessageRouter;

pub struct NotificationServiceDependencies {
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub purchases: Arc<dyn PurchaseLedger>,
    pub clock: Arc<dyn Clock>,
}

pub struct NotificationService {
    deps: NotificationServiceDependencies,
}

impl NotificationService {
    pub fn new(deps: NotificationServiceDependencies) -> Self {
        Self { deps }
    }

    pub fn now(&self) -> domain::Timestamp {
        self.deps.clock.now()
    }

    /// 定向通知：落库后，若接收者在线则推送到其收件箱房间
    pub async fn notify(
        &self,
        notification: Notification,
    ) -> Result<Notification, ApplicationError> {
        let stored = self.deps.notifications.create(&notification).await?;

        let inbox = RoomId::inbox(stored.user_id);
        self.deps
            .router
            .send_to_room(&inbox, ServerEvent::Notification(stored.clone()))
            .await;

        Ok(stored)
    }

    /// 社区广播：逐成员落库并推送，另发一条房间级轻量提示
    ///
    /// 返回实际生成的通知条数。
    pub async fn broadcast_community(
        &self,
        community_id: CommunityId,
        course_title: String,
        message: String,
        sender_id: UserId,
    ) -> Result<u64, ApplicationError> {
        let members = self
            .deps
            .purchases
            .students_of_community(community_id)
            .await?;

        let mut created = 0u64;
        for member in members {
            if member == sender_id {
                continue;
            }
            let notification = Notification::community_chat(
                member,
                message.clone(),
                community_id,
                course_title.clone(),
                sender_id,
                self.deps.clock.now(),
            );
            self.notify(notification).await?;
            created += 1;
        }

        self.deps
            .router
            .send_to_room(
                &RoomId::community(community_id),
                ServerEvent::ReceiveNotification(CommunityPing {
                    community_id,
                    course_title,
                    message,
                    sender_id,
                }),
            )
            .await;

        debug!(community_id = %community_id, created, "社区通知广播完成");
        Ok(created)
    }

    /// 标记单条通知已读，并向请求连接回发确认事件
    pub async fn mark_read(
        &self,
        connection_id: domain::ConnectionId,
        notification_id: NotificationId,
    ) -> Result<(), ApplicationError> {
        self.deps.notifications.mark_as_read(notification_id).await?;
        self.deps
            .router
            .send_to_connection(
                connection_id,
                ServerEvent::NotificationRead { notification_id },
            )
            .await;
        Ok(())
    }

    /// 批量标记用户全部通知已读
    ///
    /// 与单条变体不同，这条路径不回发任何确认事件。
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<(), ApplicationError> {
        let updated = self.deps.notifications.mark_all_as_read(user_id).await?;
        debug!(user_id = %user_id, updated, "批量标记通知已读");
        Ok(())
    }

    /// 标记匹配上下文的未读通话请求为已读（导师接受通话时调用）
    pub async fn mark_call_requests_read(
        &self,
        user_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<(), ApplicationError> {
        self.deps
            .notifications
            .mark_call_requests_read(user_id, course_id, student_id)
            .await?;
        Ok(())
    }

    /// 导师在某线程下的未读聊天通知数
    pub async fn unread_chat_messages(
        &self,
        tutor_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<u64, ApplicationError> {
        Ok(self
            .deps
            .notifications
            .count_unread_chat_messages(tutor_id, course_id, student_id)
            .await?)
    }
}
