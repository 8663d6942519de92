//! 通知Repository接口定义

use async_trait::async_trait;

use crate::entities::Notification;
use crate::errors::DomainResult;
use crate::value_objects::{CourseId, NotificationId, UserId};

/// 通知Repository接口
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 创建通知
    async fn create(&self, notification: &Notification) -> DomainResult<Notification>;

    /// 标记单条通知为已读
    async fn mark_as_read(&self, notification_id: NotificationId) -> DomainResult<()>;

    /// 标记用户所有通知为已读，返回受影响条数
    async fn mark_all_as_read(&self, user_id: UserId) -> DomainResult<u64>;

    /// 标记某用户名下匹配课程+学生上下文的未读通话请求为已读
    async fn mark_call_requests_read(
        &self,
        user_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> DomainResult<u64>;

    /// 导师在某课程+学生线程下的未读聊天通知数
    async fn count_unread_chat_messages(
        &self,
        tutor_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> DomainResult<u64>;
}
