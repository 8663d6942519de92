//! 聊天消息实体定义

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::rooms::PrivateChatId;
use crate::value_objects::{CommunityId, MessageId};

/// 消息投递状态
///
/// `Read` 在存储层可表达，但信令核心的任何处理器都不会写入它，
/// 属于保留状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Delivered => write!(f, "delivered"),
            MessageStatus::Read => write!(f, "read"),
        }
    }
}

impl From<&str> for MessageStatus {
    fn from(s: &str) -> Self {
        match s {
            "delivered" => MessageStatus::Delivered,
            "read" => MessageStatus::Read,
            _ => MessageStatus::Sent,
        }
    }
}

/// 聊天消息实体
///
/// `community_id` 与 `private_chat_id` 恰好填充一个；`timestamp` 是
/// 客户端提供的字符串，服务端不做时钟替换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// 消息ID
    pub id: MessageId,
    /// 社区ID（社区消息时填充）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_id: Option<CommunityId>,
    /// 私聊线程键（私聊消息时填充）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_chat_id: Option<PrivateChatId>,
    /// 发送者显示名（不是用户ID）
    pub sender: String,
    /// 文本内容；附带图片时允许为空
    pub content: String,
    /// 客户端时间戳
    pub timestamp: String,
    /// 投递状态
    pub status: MessageStatus,
    /// 已上传图片的外部地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ChatMessage {
    /// 创建社区消息
    pub fn community(
        community_id: CommunityId,
        sender: String,
        content: String,
        timestamp: String,
        image_url: Option<String>,
    ) -> DomainResult<Self> {
        Self::validate(&sender, &content, &timestamp, image_url.as_deref())?;
        Ok(Self {
            id: MessageId::new(Uuid::new_v4()),
            community_id: Some(community_id),
            private_chat_id: None,
            sender,
            content,
            timestamp,
            status: MessageStatus::Sent,
            image_url,
        })
    }

    /// 创建私聊消息
    pub fn private(
        private_chat_id: PrivateChatId,
        sender: String,
        content: String,
        timestamp: String,
        image_url: Option<String>,
    ) -> DomainResult<Self> {
        Self::validate(&sender, &content, &timestamp, image_url.as_deref())?;
        Ok(Self {
            id: MessageId::new(Uuid::new_v4()),
            community_id: None,
            private_chat_id: Some(private_chat_id),
            sender,
            content,
            timestamp,
            status: MessageStatus::Sent,
            image_url,
        })
    }

    fn validate(
        sender: &str,
        content: &str,
        timestamp: &str,
        image_url: Option<&str>,
    ) -> DomainResult<()> {
        if sender.trim().is_empty() {
            return Err(DomainError::validation_error("sender", "cannot be empty"));
        }
        if timestamp.trim().is_empty() {
            return Err(DomainError::validation_error(
                "timestamp",
                "cannot be empty",
            ));
        }
        // 纯文本消息必须有内容；带图片的消息允许空正文
        if content.trim().is_empty() && image_url.map_or(true, str::is_empty) {
            return Err(DomainError::validation_error("content", "cannot be empty"));
        }
        Ok(())
    }

    /// 标记为已投递
    pub fn mark_delivered(&mut self) {
        self.status = MessageStatus::Delivered;
    }
}
