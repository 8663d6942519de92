//! 入站事件分发
//!
//! 每个处理器都返回 `Result<(), ApplicationError>`；分发器是唯一的
//! 捕获边界，把任何失败统一转成发回原连接的 `error{message}` 事件。
//! 错误不会跨连接传播，也不会使进程退出。

use application::{ApplicationError, CallRequestInput, ServerEvent};
use domain::{ConnectionId, RoomId};
use tracing::warn;

use crate::protocol::ClientEvent;
use crate::state::AppState;

/// 处理一条入站事件；失败只影响发起连接
pub async fn dispatch(state: &AppState, connection_id: ConnectionId, event: ClientEvent) {
    if let Err(err) = route(state, connection_id, event).await {
        warn!(connection_id = %connection_id, error = %err, "事件处理失败");
        state
            .router
            .send_to_connection(connection_id, ServerEvent::error(err.to_string()))
            .await;
    }
}

async fn route(
    state: &AppState,
    connection_id: ConnectionId,
    event: ClientEvent,
) -> Result<(), ApplicationError> {
    match event {
        ClientEvent::JoinUser { user_id } => state.chat.join_user(connection_id, user_id).await,
        ClientEvent::JoinRoom { room_id } => {
            state
                .chat
                .join_room(connection_id, RoomId::new(room_id))
                .await
        }
        ClientEvent::JoinCommunity { community_id } => {
            state.chat.join_community(connection_id, community_id).await
        }
        ClientEvent::JoinPrivateChat {
            course_id,
            student_id,
            tutor_id,
        } => {
            state
                .chat
                .join_private_chat(connection_id, course_id, student_id, tutor_id)
                .await
        }
        ClientEvent::FetchPrivateChats { tutor_id } => {
            state
                .chat
                .fetch_private_chats(connection_id, tutor_id)
                .await
        }
        ClientEvent::SendMessage {
            community_id,
            message,
        } => {
            state
                .chat
                .send_community_message(community_id, message, None)
                .await
        }
        ClientEvent::SendPrivateMessage {
            course_id,
            student_id,
            tutor_id,
            message,
        } => {
            state
                .chat
                .send_private_message(
                    connection_id,
                    course_id,
                    student_id,
                    tutor_id,
                    message,
                    None,
                    None,
                )
                .await
        }
        ClientEvent::SendImageMessage {
            community_id,
            message,
            image,
            sender_id: _,
        } => {
            state
                .chat
                .send_community_message(community_id, message, Some(image))
                .await
        }
        ClientEvent::SendPrivateImageMessage {
            course_id,
            student_id,
            tutor_id,
            message,
            image,
            sender_id,
        } => {
            state
                .chat
                .send_private_message(
                    connection_id,
                    course_id,
                    student_id,
                    tutor_id,
                    message,
                    Some(image),
                    Some(sender_id),
                )
                .await
        }
        ClientEvent::SendNotification {
            community_id,
            course_title,
            message,
            sender_id,
        } => {
            state
                .notifications
                .broadcast_community(community_id, course_title, message, sender_id)
                .await
                .map(|_| ())
        }
        ClientEvent::MarkNotificationRead { notification_id } => {
            state
                .notifications
                .mark_read(connection_id, notification_id)
                .await
        }
        ClientEvent::MarkAllNotificationsRead { user_id } => {
            state.notifications.mark_all_read(user_id).await
        }
        ClientEvent::CallRequest {
            room_id,
            student_id,
            course_id,
            course_title,
            tutor_id,
            timestamp,
            caller_name,
        } => {
            state
                .call
                .request(
                    connection_id,
                    CallRequestInput {
                        room_id,
                        student_id,
                        course_id,
                        course_title,
                        tutor_id,
                        timestamp,
                        caller_name,
                    },
                )
                .await
        }
        ClientEvent::CallAccepted {
            call_id,
            room_id,
            receiver_id,
            user_id,
        } => {
            state
                .call
                .accept(call_id, room_id, receiver_id, user_id)
                .await
        }
        ClientEvent::JoinVideoCall {
            room_id,
            user_id,
            role,
        } => {
            state
                .call
                .join_video_call(connection_id, room_id, user_id, role)
                .await
        }
        ClientEvent::EndCall { to, call_id } => state.call.end_call(to, call_id).await,
        ClientEvent::RejectCall {
            to,
            call_id,
            name,
            sender_id,
            ..
        } => state.call.reject_call(to, call_id, name, sender_id).await,
        ClientEvent::LeaveCallRoom { to, call_id } => state.call.leave_call(to, call_id).await,
        ClientEvent::LeaveRoom { room_id } => {
            state
                .chat
                .leave_room(connection_id, RoomId::new(room_id))
                .await;
            Ok(())
        }
    }
}
