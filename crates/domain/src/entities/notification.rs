//! 通知实体定义

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{
    CommunityId, CourseId, NotificationId, Timestamp, UserId,
};

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Approval,
    Rejection,
    ChatMessage,
    CallRequest,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Approval => write!(f, "approval"),
            NotificationKind::Rejection => write!(f, "rejection"),
            NotificationKind::ChatMessage => write!(f, "chat_message"),
            NotificationKind::CallRequest => write!(f, "call_request"),
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(s: &str) -> Self {
        match s {
            "approval" => NotificationKind::Approval,
            "chat_message" => NotificationKind::ChatMessage,
            "call_request" => NotificationKind::CallRequest,
            _ => NotificationKind::Rejection,
        }
    }
}

/// 通知实体
///
/// 每条通知恰好一个接收者；向多人扇出意味着多条独立记录，
/// 而不是一条共享记录加已读集合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// 通知ID
    pub id: NotificationId,
    /// 接收者
    pub user_id: UserId,
    /// 通知类型
    pub kind: NotificationKind,
    /// 通知内容
    pub message: String,
    /// 是否已读
    pub read: bool,
    /// 创建时间
    pub created_at: Timestamp,
    /// 社区聊天上下文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_id: Option<CommunityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    /// 私聊 / 通话上下文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_id: Option<UserId>,
}

impl Notification {
    /// 创建不带上下文的通知
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        message: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: NotificationId::new(Uuid::new_v4()),
            user_id,
            kind,
            message,
            read: false,
            created_at,
            community_id: None,
            course_title: None,
            sender_id: None,
            course_id: None,
            student_id: None,
            tutor_id: None,
        }
    }

    /// 社区聊天通知
    pub fn community_chat(
        user_id: UserId,
        message: String,
        community_id: CommunityId,
        course_title: String,
        sender_id: UserId,
        created_at: Timestamp,
    ) -> Self {
        let mut n = Self::new(user_id, NotificationKind::ChatMessage, message, created_at);
        n.community_id = Some(community_id);
        n.course_title = Some(course_title);
        n.sender_id = Some(sender_id);
        n
    }

    /// 私聊 / 通话上下文通知
    pub fn private_context(
        user_id: UserId,
        kind: NotificationKind,
        message: String,
        course_id: CourseId,
        student_id: UserId,
        tutor_id: UserId,
        created_at: Timestamp,
    ) -> Self {
        let mut n = Self::new(user_id, kind, message, created_at);
        n.course_id = Some(course_id);
        n.student_id = Some(student_id);
        n.tutor_id = Some(tutor_id);
        n
    }

    /// 标记为已读
    pub fn mark_as_read(&mut self) {
        self.read = true;
    }
}
