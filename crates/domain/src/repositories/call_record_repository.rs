//! 通话记录Repository接口定义

use async_trait::async_trait;

use crate::entities::CallRecord;
use crate::errors::DomainResult;
use crate::value_objects::{CallId, Timestamp};

/// 通话记录Repository接口
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// 创建通话记录
    async fn create(&self, record: &CallRecord) -> DomainResult<CallRecord>;

    /// 根据ID查找通话记录
    async fn find_by_id(&self, id: CallId) -> DomainResult<Option<CallRecord>>;

    /// 覆盖开始时间（导师接受时调用）
    async fn set_start_time(&self, id: CallId, start_time: Timestamp) -> DomainResult<()>;
}
