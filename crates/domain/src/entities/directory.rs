//! 外部目录视图
//!
//! 信令核心不拥有用户、课程和购买记录；这些实体由市场侧的
//! REST 层维护，这里只定义核心需要的只读投影。

use serde::{Deserialize, Serialize};

use crate::value_objects::{CourseId, UserId};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Tutor,
    Admin,
}

/// 用户目录投影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
}

/// 课程目录投影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub tutor_id: UserId,
}

/// 已完成购买的一条记录（按导师维度查询时返回）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Purchase {
    pub course_id: CourseId,
    pub student_id: UserId,
}
