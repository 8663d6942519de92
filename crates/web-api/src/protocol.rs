//! 入站事件定义
//!
//! 客户端发来的每个帧都是 `{"event": "...", "data": {...}}` 形状的
//! JSON 文本。字段类型即校验：ID 字段解析失败的帧在反序列化阶段
//! 就被拒绝，统一回发一个 `error` 事件。

use serde::Deserialize;

use application::IncomingMessage;
use domain::{CallId, CommunityId, CourseId, NotificationId, UserId};

/// 客户端发给服务端的事件
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    #[serde(rename = "join_user")]
    JoinUser { user_id: UserId },

    #[serde(rename = "join_room")]
    JoinRoom { room_id: String },

    #[serde(rename = "join_community")]
    JoinCommunity { community_id: CommunityId },

    #[serde(rename = "join_private_chat")]
    JoinPrivateChat {
        course_id: CourseId,
        student_id: UserId,
        tutor_id: UserId,
    },

    #[serde(rename = "fetch_private_chats")]
    FetchPrivateChats { tutor_id: UserId },

    #[serde(rename = "send_message")]
    SendMessage {
        community_id: CommunityId,
        message: IncomingMessage,
    },

    #[serde(rename = "send_private_message")]
    SendPrivateMessage {
        course_id: CourseId,
        student_id: UserId,
        tutor_id: UserId,
        message: IncomingMessage,
    },

    #[serde(rename = "send_image_message")]
    SendImageMessage {
        community_id: CommunityId,
        #[serde(default)]
        message: IncomingMessage,
        image: String,
        sender_id: UserId,
    },

    #[serde(rename = "send_private_image_message")]
    SendPrivateImageMessage {
        course_id: CourseId,
        student_id: UserId,
        tutor_id: UserId,
        #[serde(default)]
        message: IncomingMessage,
        image: String,
        sender_id: UserId,
    },

    #[serde(rename = "send_notification")]
    SendNotification {
        community_id: CommunityId,
        course_title: String,
        message: String,
        sender_id: UserId,
    },

    #[serde(rename = "mark_private_message_notification_as_read")]
    MarkNotificationRead { notification_id: NotificationId },

    #[serde(rename = "mark_all_notifications_as_read")]
    MarkAllNotificationsRead { user_id: UserId },

    #[serde(rename = "call_request")]
    CallRequest {
        room_id: String,
        student_id: UserId,
        course_id: CourseId,
        course_title: String,
        tutor_id: UserId,
        timestamp: String,
        caller_name: String,
    },

    #[serde(rename = "call_accepted")]
    CallAccepted {
        call_id: CallId,
        room_id: String,
        receiver_id: UserId,
        user_id: UserId,
    },

    #[serde(rename = "joinVideoCall")]
    JoinVideoCall {
        room_id: String,
        user_id: UserId,
        role: String,
    },

    #[serde(rename = "end_call")]
    EndCall { to: UserId, call_id: CallId },

    #[serde(rename = "reject-call")]
    RejectCall {
        to: UserId,
        call_id: CallId,
        #[serde(default)]
        sender: Option<String>,
        name: String,
        sender_id: UserId,
        #[serde(default)]
        from: Option<UserId>,
    },

    #[serde(rename = "leave-room")]
    LeaveCallRoom { to: UserId, call_id: CallId },

    #[serde(rename = "leave_room")]
    LeaveRoom { room_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_event_names() {
        let raw = format!(
            r#"{{"event":"join_user","data":{{"userId":"{}"}}}}"#,
            uuid::Uuid::new_v4()
        );
        let event: ClientEvent = serde_json::from_str(&raw).unwrap();
        assert!(matches!(event, ClientEvent::JoinUser { .. }));

        let raw = format!(
            r#"{{"event":"reject-call","data":{{"to":"{0}","callId":"{1}","name":"Tina","senderId":"{0}"}}}}"#,
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4()
        );
        let event: ClientEvent = serde_json::from_str(&raw).unwrap();
        assert!(matches!(event, ClientEvent::RejectCall { .. }));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let raw = r#"{"event":"join_user","data":{"userId":"not-a-uuid"}}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());

        let raw = r#"{"event":"no_such_event","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }
}
