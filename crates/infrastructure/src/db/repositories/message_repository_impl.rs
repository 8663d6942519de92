//! 消息Repository实现

use async_trait::async_trait;
use domain::{
    ChatMessage, CommunityId, DomainError, DomainResult, MessageId, MessageRepository,
    MessageStatus, PrivateChatId, UserId,
};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbPool;

/// 数据库消息模型
#[derive(Debug, Clone, FromRow)]
struct DbMessage {
    pub id: Uuid,
    pub community_id: Option<Uuid>,
    pub private_chat_id: Option<String>,
    pub sender: String,
    pub content: String,
    pub timestamp: String,
    pub status: String,
    pub image_url: Option<String>,
}

impl TryFrom<DbMessage> for ChatMessage {
    type Error = DomainError;

    fn try_from(row: DbMessage) -> Result<Self, Self::Error> {
        let private_chat_id = row
            .private_chat_id
            .as_deref()
            .map(str::parse::<PrivateChatId>)
            .transpose()?;

        Ok(ChatMessage {
            id: MessageId::from(row.id),
            community_id: row.community_id.map(CommunityId::from),
            private_chat_id,
            sender: row.sender,
            content: row.content,
            timestamp: row.timestamp,
            status: MessageStatus::from(row.status.as_str()),
            image_url: row.image_url,
        })
    }
}

/// 消息Repository实现
pub struct PostgresMessageRepository {
    pool: Arc<DbPool>,
}

impl PostgresMessageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

fn storage_err(err: sqlx::Error) -> DomainError {
    DomainError::storage_error(err.to_string())
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn create(&self, message: &ChatMessage) -> DomainResult<ChatMessage> {
        sqlx::query(
            r#"INSERT INTO chat_messages
                   (id, community_id, private_chat_id, sender, content, "timestamp", status, image_url)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.community_id.map(Uuid::from))
        .bind(message.private_chat_id.map(|key| key.to_string()))
        .bind(&message.sender)
        .bind(&message.content)
        .bind(&message.timestamp)
        .bind(message.status.to_string())
        .bind(&message.image_url)
        .execute(&*self.pool)
        .await
        .map_err(storage_err)?;

        Ok(message.clone())
    }

    async fn set_status(&self, id: MessageId, status: MessageStatus) -> DomainResult<()> {
        sqlx::query("UPDATE chat_messages SET status = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(status.to_string())
            .execute(&*self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn recent_by_community(
        &self,
        community_id: CommunityId,
        limit: u32,
    ) -> DomainResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"SELECT id, community_id, private_chat_id, sender, content, "timestamp", status, image_url
               FROM chat_messages
               WHERE community_id = $1
               ORDER BY "timestamp" DESC
               LIMIT $2"#,
        )
        .bind(Uuid::from(community_id))
        .bind(i64::from(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_err)?;

        // 取最近 N 条后按时间升序返回
        let mut messages = rows
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn recent_by_private_chat(
        &self,
        key: &PrivateChatId,
        limit: u32,
    ) -> DomainResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"SELECT id, community_id, private_chat_id, sender, content, "timestamp", status, image_url
               FROM chat_messages
               WHERE private_chat_id = $1
               ORDER BY "timestamp" DESC
               LIMIT $2"#,
        )
        .bind(key.to_string())
        .bind(i64::from(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_err)?;

        let mut messages = rows
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn latest_per_private_chat(&self, tutor_id: UserId) -> DomainResult<Vec<ChatMessage>> {
        // 复合键最后一段固定是导师ID
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"SELECT DISTINCT ON (private_chat_id)
                      id, community_id, private_chat_id, sender, content, "timestamp", status, image_url
               FROM chat_messages
               WHERE private_chat_id IS NOT NULL
                 AND split_part(private_chat_id, '_', 4) = $1
               ORDER BY private_chat_id, "timestamp" DESC"#,
        )
        .bind(Uuid::from(tutor_id).to_string())
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter().map(ChatMessage::try_from).collect()
    }
}
