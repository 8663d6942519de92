//! 通话信令状态机
//!
//! requested → accepted → (joined)* → ended，旁路退出 rejected / left。
//! 状态只存在于事件序列中，通话记录本身不保存状态字段。
//! 所有指向单个用户的推送都经由连接注册表直达对方连接，
//! 不经过房间广播；对方不在线是正常分支，不重试不排队。

use std::sync::Arc;

use domain::{
    CallId, CallRecord, CallRecordRepository, ConnectionId, CourseDirectory, CourseId,
    DomainError, Notification, NotificationKind, RoomId, UserDirectory, UserId,
};
use tracing::debug;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::events::ServerEvent;
use crate::media_token::MediaTokenIssuer;
use crate::registry::ConnectionRegistry;
use crate::router::MessageRouter;
use crate::services::notification_service::NotificationService;

/// 发起通话请求的入参
#[derive(Debug, Clone)]
pub struct CallRequestInput {
    pub room_id: String,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub course_title: String,
    pub tutor_id: UserId,
    pub timestamp: String,
    pub caller_name: String,
}

pub struct CallServiceDependencies {
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub calls: Arc<dyn CallRecordRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub courses: Arc<dyn CourseDirectory>,
    pub notifications: Arc<NotificationService>,
    pub tokens: Arc<dyn MediaTokenIssuer>,
    pub clock: Arc<dyn Clock>,
}

pub struct CallService {
    deps: CallServiceDependencies,
}

impl CallService {
    pub fn new(deps: CallServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发起通话：落库通知和通话记录，导师在线则直推请求，
    /// 否则告知发起方导师不可达（记录仍然保留）
    pub async fn request(
        &self,
        connection_id: ConnectionId,
        input: CallRequestInput,
    ) -> Result<(), ApplicationError> {
        let student = self
            .deps
            .users
            .find_by_id(input.student_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("student", input.student_id.to_string())
            })?;
        let course = self
            .deps
            .courses
            .find_by_id(input.course_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("course", input.course_id.to_string())
            })?;
        self.deps
            .users
            .find_by_id(input.tutor_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("tutor", input.tutor_id.to_string())
            })?;

        let now = self.deps.clock.now();
        let record = CallRecord::new(
            input.tutor_id,
            input.student_id,
            input.course_id,
            course.title.clone(),
            now,
        );
        let record = self.deps.calls.create(&record).await?;

        self.deps
            .notifications
            .notify(Notification::private_context(
                input.tutor_id,
                NotificationKind::CallRequest,
                format!("{} is requesting a video call", input.caller_name),
                input.course_id,
                input.student_id,
                input.tutor_id,
                now,
            ))
            .await?;

        match self.deps.registry.resolve_socket(input.tutor_id).await {
            Some(tutor_conn) => {
                self.deps
                    .router
                    .send_to_connection(
                        tutor_conn,
                        ServerEvent::CallRequest {
                            call_id: record.id,
                            room_id: input.room_id,
                            student_id: input.student_id,
                            course_id: input.course_id,
                            course_title: course.title,
                            tutor_id: input.tutor_id,
                            timestamp: input.timestamp,
                            caller_name: input.caller_name,
                        },
                    )
                    .await;
            }
            None => {
                debug!(tutor_id = %input.tutor_id, student = %student.name, "导师不在线，通话请求仅落库");
                self.deps
                    .router
                    .send_to_connection(
                        connection_id,
                        ServerEvent::error("Tutor is not available right now"),
                    )
                    .await;
            }
        }
        Ok(())
    }

    /// 接受通话：覆盖开始时间为接受时刻，为双方各自签发令牌并直推，
    /// 不在线的一方跳过并记录日志（不使整个握手失败），
    /// 最后把原始请求通知标记为已读
    pub async fn accept(
        &self,
        call_id: CallId,
        room_id: String,
        receiver_id: UserId,
        user_id: UserId,
    ) -> Result<(), ApplicationError> {
        let record = self
            .deps
            .calls
            .find_by_id(call_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("call", call_id.to_string()))?;

        self.deps
            .calls
            .set_start_time(call_id, self.deps.clock.now())
            .await?;

        for (participant, partner) in [(user_id, receiver_id), (receiver_id, user_id)] {
            let token = self.deps.tokens.mint(participant, &room_id);
            match self.deps.registry.resolve_socket(participant).await {
                Some(conn) => {
                    self.deps
                        .router
                        .send_to_connection(
                            conn,
                            ServerEvent::VideoCallStarted {
                                room_id: room_id.clone(),
                                room_name: record.course_name.clone(),
                                token,
                                call_id,
                                partner_id: partner,
                            },
                        )
                        .await;
                }
                None => {
                    debug!(participant = %participant, call_id = %call_id, "参与者不在线，跳过令牌投递");
                }
            }
        }

        self.deps
            .notifications
            .mark_call_requests_read(record.tutor_id, record.course_id, record.student_id)
            .await?;
        Ok(())
    }

    /// 加入视频通话房间（迟到/多方参与者路径）
    ///
    /// 独立于请求/接受握手：任何连接提供房间与用户即可获发令牌
    /// 并加入房间，随后通知整个房间有参与者加入；不复查接受状态。
    pub async fn join_video_call(
        &self,
        connection_id: ConnectionId,
        room_id: String,
        user_id: UserId,
        role: String,
    ) -> Result<(), ApplicationError> {
        let token = self.deps.tokens.mint(user_id, &room_id);
        let room = RoomId::new(room_id.clone());
        self.deps.registry.join_room(connection_id, room.clone()).await;

        debug!(user_id = %user_id, room_id = %room_id, role, "参与者加入视频房间");
        self.deps
            .router
            .send_to_room(
                &room,
                ServerEvent::VideoCallJoined {
                    room_id: room_id.clone(),
                    room_name: room_id,
                    token,
                },
            )
            .await;
        Ok(())
    }

    /// 结束通话：直推终止事件给对端；通话记录不做任何变更
    pub async fn end_call(&self, to: UserId, call_id: CallId) -> Result<(), ApplicationError> {
        if !self
            .deps
            .router
            .send_to_user(to, ServerEvent::CallEnded { call_id })
            .await
        {
            debug!(to = %to, call_id = %call_id, "对端不在线，结束事件丢弃");
        }
        Ok(())
    }

    /// 拒绝通话：直推拒绝事件，并给对端留一条提示通知
    pub async fn reject_call(
        &self,
        to: UserId,
        call_id: CallId,
        name: String,
        sender_id: UserId,
    ) -> Result<(), ApplicationError> {
        self.deps
            .router
            .send_to_user(
                to,
                ServerEvent::CallRejected {
                    call_id,
                    name: name.clone(),
                    sender_id,
                },
            )
            .await;

        self.deps
            .notifications
            .notify(Notification::new(
                to,
                NotificationKind::Rejection,
                format!("{} rejected your call", name),
                self.deps.clock.now(),
            ))
            .await?;
        Ok(())
    }

    /// 单方挂断：直推离开事件，并给仍在通话的对端留一条提示通知
    pub async fn leave_call(&self, to: UserId, call_id: CallId) -> Result<(), ApplicationError> {
        self.deps
            .router
            .send_to_user(to, ServerEvent::UserLeft { call_id })
            .await;

        self.deps
            .notifications
            .notify(Notification::new(
                to,
                NotificationKind::Rejection,
                "Your partner left the call".to_string(),
                self.deps.clock.now(),
            ))
            .await?;
        Ok(())
    }
}
