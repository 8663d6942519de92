//! 出站事件定义
//!
//! 客户端收到的每个事件都是 `{"event": "...", "data": {...}}` 形状的
//! JSON 文本帧，事件名与字段名沿用既有前端的约定。

use serde::Serialize;

use domain::{CallId, ChatMessage, CourseId, Notification, NotificationId, RoomId, UserId};

use crate::dto::{CommunityPing, PrivateChatSummary, PrivateMessagePayload};

/// 服务端推送给客户端的事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    #[serde(rename = "joined_room")]
    JoinedRoom { room_id: RoomId },

    #[serde(rename = "message_history")]
    MessageHistory(Vec<ChatMessage>),

    #[serde(rename = "private_message_history")]
    PrivateMessageHistory(Vec<ChatMessage>),

    #[serde(rename = "private_chats")]
    PrivateChats { chats: Vec<PrivateChatSummary> },

    #[serde(rename = "receive_message")]
    ReceiveMessage(ChatMessage),

    #[serde(rename = "receive_private_message")]
    ReceivePrivateMessage(PrivateMessagePayload),

    #[serde(rename = "notification")]
    Notification(Notification),

    #[serde(rename = "receive_notification")]
    ReceiveNotification(CommunityPing),

    #[serde(rename = "notification_read")]
    NotificationRead { notification_id: NotificationId },

    #[serde(rename = "call_request")]
    CallRequest {
        call_id: CallId,
        room_id: String,
        student_id: UserId,
        course_id: CourseId,
        course_title: String,
        tutor_id: UserId,
        timestamp: String,
        caller_name: String,
    },

    #[serde(rename = "videoCallStarted")]
    VideoCallStarted {
        room_id: String,
        room_name: String,
        token: String,
        call_id: CallId,
        partner_id: UserId,
    },

    #[serde(rename = "videoCallJoined")]
    VideoCallJoined {
        room_id: String,
        room_name: String,
        token: String,
    },

    #[serde(rename = "call_ended")]
    CallEnded { call_id: CallId },

    #[serde(rename = "call-rejected")]
    CallRejected {
        call_id: CallId,
        name: String,
        sender_id: UserId,
    },

    #[serde(rename = "user-left")]
    UserLeft { call_id: CallId },

    #[serde(rename = "fetch_private_chats")]
    FetchPrivateChats { tutor_id: UserId },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    /// 面向单个客户端的错误事件
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
