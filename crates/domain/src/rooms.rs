//! 房间标识推导规则
//!
//! 房间不是存储实体，而是由领域 ID 推导出的字符串标识：
//! - 用户收件箱房间 = 用户 ID 本身
//! - 社区房间 = 社区 ID
//! - 私聊房间 = `private_{courseId}_{studentId}_{tutorId}`（固定顺序拼接）

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::value_objects::{CommunityId, CourseId, UserId};

/// 广播房间标识。
///
/// 相同输入永远推导出相同的字符串，不做任何哈希。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// 客户端直接提供的房间名（视频通话房间走这条路）。
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// 用户收件箱房间。
    pub fn inbox(user_id: UserId) -> Self {
        Self(user_id.to_string())
    }

    /// 社区（课程公共讨论区）房间。
    pub fn community(community_id: CommunityId) -> Self {
        Self(community_id.to_string())
    }

    /// 私聊房间。
    pub fn private_chat(key: &PrivateChatId) -> Self {
        Self(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 私聊线程的复合键：一个学生和一个导师在一门课程下的 1:1 会话。
///
/// 序列化为 `private_{courseId}_{studentId}_{tutorId}` 形式的字符串；
/// 三元组顺序固定，因此不会出现顺序不同导致的键碰撞。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivateChatId {
    pub course_id: CourseId,
    pub student_id: UserId,
    pub tutor_id: UserId,
}

impl PrivateChatId {
    pub fn derive(course_id: CourseId, student_id: UserId, tutor_id: UserId) -> Self {
        Self {
            course_id,
            student_id,
            tutor_id,
        }
    }

    pub fn room_id(&self) -> RoomId {
        RoomId::private_chat(self)
    }
}

impl fmt::Display for PrivateChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "private_{}_{}_{}",
            self.course_id, self.student_id, self.tutor_id
        )
    }
}

impl FromStr for PrivateChatId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // UUID 内不含下划线，按下划线切分即可还原三元组
        let parts: Vec<&str> = value.split('_').collect();
        if parts.len() != 4 || parts[0] != "private" {
            return Err(DomainError::validation_error(
                "private_chat_id",
                "malformed composite key",
            ));
        }
        let parse = |segment: &str, field: &str| {
            Uuid::parse_str(segment)
                .map_err(|_| DomainError::validation_error(field, "not a valid id"))
        };
        Ok(Self {
            course_id: CourseId::from(parse(parts[1], "course_id")?),
            student_id: UserId::from(parse(parts[2], "student_id")?),
            tutor_id: UserId::from(parse(parts[3], "tutor_id")?),
        })
    }
}

impl Serialize for PrivateChatId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrivateChatId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
