//! 外部目录查询接口
//!
//! 所有未命中都返回 `Ok(None)` / 空集合，而不是错误：
//! 调用方把"查不到"当作正常分支处理。

use async_trait::async_trait;

use crate::entities::directory::{CourseSummary, Purchase, UserProfile};
use crate::errors::DomainResult;
use crate::value_objects::{CommunityId, CourseId, UserId};

/// 用户目录查询
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<UserProfile>>;
}

/// 课程目录查询
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn find_by_id(&self, id: CourseId) -> DomainResult<Option<CourseSummary>>;
}

/// 购买/报名记录查询
///
/// 社区成员资格不是存储的成员表，而是从已完成的购买记录推导。
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// 某社区对应课程的全部已付费学生
    async fn students_of_community(&self, community_id: CommunityId)
        -> DomainResult<Vec<UserId>>;

    /// 某导师名下所有课程的已完成购买
    async fn purchases_by_tutor(&self, tutor_id: UserId) -> DomainResult<Vec<Purchase>>;
}
