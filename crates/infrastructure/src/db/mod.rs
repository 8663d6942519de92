//! Database utilities and repositories (Core DB Layer)

use sqlx::{Pool, Postgres};

pub mod repositories;

pub type DbPool = Pool<Postgres>;

/// 创建 PostgreSQL 连接池
pub async fn create_pg_pool(database_url: &str, max_size: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_size)
        .connect(database_url)
        .await
}
