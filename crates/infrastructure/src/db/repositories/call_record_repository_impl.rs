//! 通话记录Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    CallId, CallRecord, CallRecordRepository, CourseId, DomainError, DomainResult, Timestamp,
    UserId,
};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbPool;

/// 数据库通话记录模型
#[derive(Debug, Clone, FromRow)]
struct DbCallRecord {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub course_name: String,
    pub start_time: DateTime<Utc>,
}

impl From<DbCallRecord> for CallRecord {
    fn from(row: DbCallRecord) -> Self {
        CallRecord {
            id: CallId::from(row.id),
            tutor_id: UserId::from(row.tutor_id),
            student_id: UserId::from(row.student_id),
            course_id: CourseId::from(row.course_id),
            course_name: row.course_name,
            start_time: row.start_time,
        }
    }
}

/// 通话记录Repository实现
pub struct PostgresCallRecordRepository {
    pool: Arc<DbPool>,
}

impl PostgresCallRecordRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

fn storage_err(err: sqlx::Error) -> DomainError {
    DomainError::storage_error(err.to_string())
}

#[async_trait]
impl CallRecordRepository for PostgresCallRecordRepository {
    async fn create(&self, record: &CallRecord) -> DomainResult<CallRecord> {
        sqlx::query(
            r#"INSERT INTO call_records (id, tutor_id, student_id, course_id, course_name, start_time)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(Uuid::from(record.id))
        .bind(Uuid::from(record.tutor_id))
        .bind(Uuid::from(record.student_id))
        .bind(Uuid::from(record.course_id))
        .bind(&record.course_name)
        .bind(record.start_time)
        .execute(&*self.pool)
        .await
        .map_err(storage_err)?;

        Ok(record.clone())
    }

    async fn find_by_id(&self, id: CallId) -> DomainResult<Option<CallRecord>> {
        let row = sqlx::query_as::<_, DbCallRecord>(
            r#"SELECT id, tutor_id, student_id, course_id, course_name, start_time
               FROM call_records WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(CallRecord::from))
    }

    async fn set_start_time(&self, id: CallId, start_time: Timestamp) -> DomainResult<()> {
        let result = sqlx::query("UPDATE call_records SET start_time = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(start_time)
            .execute(&*self.pool)
            .await
            .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::resource_not_found("call", id.to_string()));
        }
        Ok(())
    }
}
