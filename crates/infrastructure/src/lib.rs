//! 基础设施层实现。
//!
//! 提供领域接口的 PostgreSQL 实现和内存实现。内存实现用于
//! 测试和本地开发，与数据库实现遵循完全相同的契约。

pub mod db;
pub mod memory;

pub use db::repositories::{
    PostgresCallRecordRepository, PostgresCourseDirectory, PostgresMessageRepository,
    PostgresNotificationRepository, PostgresPurchaseLedger, PostgresUserDirectory,
};
pub use db::{create_pg_pool, DbPool};
pub use memory::{
    InMemoryCallRecordRepository, InMemoryCourseDirectory, InMemoryMessageRepository,
    InMemoryNotificationRepository, InMemoryPurchaseLedger, InMemoryUserDirectory,
};
