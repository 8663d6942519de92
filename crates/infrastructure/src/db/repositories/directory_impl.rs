//! 外部目录查询实现
//!
//! 用户、课程、购买记录归市场侧的 REST 层所有，这里只做只读查询。

use async_trait::async_trait;
use domain::{
    CommunityId, CourseDirectory, CourseId, CourseSummary, DomainError, DomainResult, Purchase,
    PurchaseLedger, UserDirectory, UserId, UserProfile, UserRole,
};
use sqlx::{FromRow, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbPool;

fn storage_err(err: sqlx::Error) -> DomainError {
    DomainError::storage_error(err.to_string())
}

#[derive(Debug, Clone, FromRow)]
struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub role: String,
}

impl From<DbUser> for UserProfile {
    fn from(row: DbUser) -> Self {
        let role = match row.role.as_str() {
            "tutor" => UserRole::Tutor,
            "admin" => UserRole::Admin,
            _ => UserRole::Student,
        };
        UserProfile {
            id: UserId::from(row.id),
            name: row.name,
            role,
        }
    }
}

/// 用户目录实现
pub struct PostgresUserDirectory {
    pool: Arc<DbPool>,
}

impl PostgresUserDirectory {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<UserProfile>> {
        let row =
            sqlx::query_as::<_, DbUser>("SELECT id, name, role FROM users WHERE id = $1")
                .bind(Uuid::from(id))
                .fetch_optional(&*self.pool)
                .await
                .map_err(storage_err)?;
        Ok(row.map(UserProfile::from))
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbCourse {
    pub id: Uuid,
    pub title: String,
    pub tutor_id: Uuid,
}

/// 课程目录实现
pub struct PostgresCourseDirectory {
    pool: Arc<DbPool>,
}

impl PostgresCourseDirectory {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseDirectory for PostgresCourseDirectory {
    async fn find_by_id(&self, id: CourseId) -> DomainResult<Option<CourseSummary>> {
        let row = sqlx::query_as::<_, DbCourse>(
            "SELECT id, title, tutor_id FROM courses WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(|course| CourseSummary {
            id: CourseId::from(course.id),
            title: course.title,
            tutor_id: UserId::from(course.tutor_id),
        }))
    }
}

/// 购买记录查询实现
///
/// 社区成员资格每次都从已完成的购买记录现算，没有成员表。
pub struct PostgresPurchaseLedger {
    pool: Arc<DbPool>,
}

impl PostgresPurchaseLedger {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseLedger for PostgresPurchaseLedger {
    async fn students_of_community(
        &self,
        community_id: CommunityId,
    ) -> DomainResult<Vec<UserId>> {
        let rows = sqlx::query(
            r#"SELECT p.student_id FROM purchases p
               JOIN communities c ON c.course_id = p.course_id
               WHERE c.id = $1 AND p.status = 'completed'"#,
        )
        .bind(Uuid::from(community_id))
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<Uuid, _>("student_id")
                    .map(UserId::from)
                    .map_err(storage_err)
            })
            .collect()
    }

    async fn purchases_by_tutor(&self, tutor_id: UserId) -> DomainResult<Vec<Purchase>> {
        let rows = sqlx::query(
            r#"SELECT p.course_id, p.student_id FROM purchases p
               JOIN courses c ON c.id = p.course_id
               WHERE c.tutor_id = $1 AND p.status = 'completed'"#,
        )
        .bind(Uuid::from(tutor_id))
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                let course_id: Uuid = row.try_get("course_id").map_err(storage_err)?;
                let student_id: Uuid = row.try_get("student_id").map_err(storage_err)?;
                Ok(Purchase {
                    course_id: CourseId::from(course_id),
                    student_id: UserId::from(student_id),
                })
            })
            .collect()
    }
}
