//! 出站事件的组合负载

use serde::Serialize;

use domain::{ChatMessage, CommunityId, CourseId, PrivateChatId, UserId};

/// 私聊消息的增强负载：消息本体加课程/学生显示信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub course_title: String,
    pub student_name: String,
}

/// 导师私聊列表中的一个线程条目
///
/// `latest_message` 为 `null` 表示付费学生尚未被导师回复过。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateChatSummary {
    pub private_chat_id: PrivateChatId,
    pub course_id: CourseId,
    pub course_title: String,
    pub student_id: UserId,
    pub student_name: String,
    pub latest_message: Option<ChatMessage>,
    pub unread_count: u64,
}

/// 社区房间收到的轻量"有新消息"提示
///
/// 与逐用户持久化的通知记录是两层扇出，互不替代。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPing {
    pub community_id: CommunityId,
    pub course_title: String,
    pub message: String,
    pub sender_id: UserId,
}
