//! 通知Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    CommunityId, CourseId, DomainError, DomainResult, Notification, NotificationId,
    NotificationKind, NotificationRepository, UserId,
};
use sqlx::{FromRow, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbPool;

/// 数据库通知模型
#[derive(Debug, Clone, FromRow)]
struct DbNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub community_id: Option<Uuid>,
    pub course_title: Option<String>,
    pub sender_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub tutor_id: Option<Uuid>,
}

impl From<DbNotification> for Notification {
    fn from(row: DbNotification) -> Self {
        Notification {
            id: NotificationId::from(row.id),
            user_id: UserId::from(row.user_id),
            kind: NotificationKind::from(row.kind.as_str()),
            message: row.message,
            read: row.read,
            created_at: row.created_at,
            community_id: row.community_id.map(CommunityId::from),
            course_title: row.course_title,
            sender_id: row.sender_id.map(UserId::from),
            course_id: row.course_id.map(CourseId::from),
            student_id: row.student_id.map(UserId::from),
            tutor_id: row.tutor_id.map(UserId::from),
        }
    }
}

/// 通知Repository实现
pub struct PostgresNotificationRepository {
    pool: Arc<DbPool>,
}

impl PostgresNotificationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

fn storage_err(err: sqlx::Error) -> DomainError {
    DomainError::storage_error(err.to_string())
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: &Notification) -> DomainResult<Notification> {
        sqlx::query(
            r#"INSERT INTO notifications
                   (id, user_id, kind, message, read, created_at,
                    community_id, course_title, sender_id, course_id, student_id, tutor_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(Uuid::from(notification.id))
        .bind(Uuid::from(notification.user_id))
        .bind(notification.kind.to_string())
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at)
        .bind(notification.community_id.map(Uuid::from))
        .bind(&notification.course_title)
        .bind(notification.sender_id.map(Uuid::from))
        .bind(notification.course_id.map(Uuid::from))
        .bind(notification.student_id.map(Uuid::from))
        .bind(notification.tutor_id.map(Uuid::from))
        .execute(&*self.pool)
        .await
        .map_err(storage_err)?;

        Ok(notification.clone())
    }

    async fn mark_as_read(&self, notification_id: NotificationId) -> DomainResult<()> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(Uuid::from(notification_id))
            .execute(&*self.pool)
            .await
            .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::resource_not_found(
                "notification",
                notification_id.to_string(),
            ));
        }
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: UserId) -> DomainResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
                .bind(Uuid::from(user_id))
                .execute(&*self.pool)
                .await
                .map_err(storage_err)?;
        Ok(result.rows_affected())
    }

    async fn mark_call_requests_read(
        &self,
        user_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"UPDATE notifications SET read = TRUE
               WHERE user_id = $1 AND kind = 'call_request'
                 AND course_id = $2 AND student_id = $3 AND NOT read"#,
        )
        .bind(Uuid::from(user_id))
        .bind(Uuid::from(course_id))
        .bind(Uuid::from(student_id))
        .execute(&*self.pool)
        .await
        .map_err(storage_err)?;
        Ok(result.rows_affected())
    }

    async fn count_unread_chat_messages(
        &self,
        tutor_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> DomainResult<u64> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS unread FROM notifications
               WHERE user_id = $1 AND kind = 'chat_message'
                 AND course_id = $2 AND student_id = $3 AND NOT read"#,
        )
        .bind(Uuid::from(tutor_id))
        .bind(Uuid::from(course_id))
        .bind(Uuid::from(student_id))
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_err)?;

        let unread: i64 = row.try_get("unread").map_err(storage_err)?;
        Ok(unread as u64)
    }
}
