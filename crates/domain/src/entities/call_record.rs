//! 通话记录实体定义

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{CallId, CourseId, Timestamp, UserId};

/// 通话记录
///
/// 记录在发起通话时创建，`start_time` 在导师接受时被覆盖为接受时刻。
/// 没有结束时间和状态字段：无法查询"通话是否完成/持续多久"。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// 通话ID
    pub id: CallId,
    /// 导师
    pub tutor_id: UserId,
    /// 学生
    pub student_id: UserId,
    /// 课程
    pub course_id: CourseId,
    /// 课程名称快照
    pub course_name: String,
    /// 发起时刻，接受时被覆盖
    pub start_time: Timestamp,
}

impl CallRecord {
    pub fn new(
        tutor_id: UserId,
        student_id: UserId,
        course_id: CourseId,
        course_name: String,
        start_time: Timestamp,
    ) -> Self {
        Self {
            id: CallId::new(Uuid::new_v4()),
            tutor_id,
            student_id,
            course_id,
            course_name,
            start_time,
        }
    }
}
