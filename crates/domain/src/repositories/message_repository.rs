//! 消息Repository接口定义

use async_trait::async_trait;

use crate::entities::message::{ChatMessage, MessageStatus};
use crate::errors::DomainResult;
use crate::rooms::PrivateChatId;
use crate::value_objects::{CommunityId, MessageId, UserId};

/// 消息Repository接口
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 创建新消息
    async fn create(&self, message: &ChatMessage) -> DomainResult<ChatMessage>;

    /// 更新消息投递状态
    async fn set_status(&self, id: MessageId, status: MessageStatus) -> DomainResult<()>;

    /// 获取社区最近的消息，按时间戳升序返回
    async fn recent_by_community(
        &self,
        community_id: CommunityId,
        limit: u32,
    ) -> DomainResult<Vec<ChatMessage>>;

    /// 获取私聊线程最近的消息，按时间戳升序返回
    async fn recent_by_private_chat(
        &self,
        key: &PrivateChatId,
        limit: u32,
    ) -> DomainResult<Vec<ChatMessage>>;

    /// 导师名下每个私聊线程的最新一条消息
    async fn latest_per_private_chat(&self, tutor_id: UserId) -> DomainResult<Vec<ChatMessage>>;
}
