//! 主应用程序入口
//!
//! 启动信令服务：加载配置、连接数据库、组装各层服务并监听。

use std::sync::Arc;

use application::{
    CallService, CallServiceDependencies, ChatService, ChatServiceDependencies,
    ConnectionRegistry, HmacMediaTokenIssuer, MessageRouter, NotificationService,
    NotificationServiceDependencies, SystemClock,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, PostgresCallRecordRepository, PostgresCourseDirectory,
    PostgresMessageRepository, PostgresNotificationRepository, PostgresPurchaseLedger,
    PostgresUserDirectory,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置
    let config = AppConfig::from_env();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );
    let pg_pool = Arc::new(
        create_pg_pool(&config.database.url, config.database.max_connections).await?,
    );

    // 仓库与外部目录
    let messages = Arc::new(PostgresMessageRepository::new(pg_pool.clone()));
    let notification_rows = Arc::new(PostgresNotificationRepository::new(pg_pool.clone()));
    let calls = Arc::new(PostgresCallRecordRepository::new(pg_pool.clone()));
    let users = Arc::new(PostgresUserDirectory::new(pg_pool.clone()));
    let courses = Arc::new(PostgresCourseDirectory::new(pg_pool.clone()));
    let purchases = Arc::new(PostgresPurchaseLedger::new(pg_pool.clone()));

    // 进程内信令状态
    let registry = Arc::new(ConnectionRegistry::new());
    let message_router = Arc::new(MessageRouter::new(registry.clone()));
    let clock = Arc::new(SystemClock);
    let tokens = Arc::new(HmacMediaTokenIssuer::new(&config.media));

    if config.media.app_secret.is_none() {
        tracing::warn!("MEDIA_APP_SECRET 未配置，媒体令牌将退化为哨兵值");
    }

    // 用例服务
    let notifications = Arc::new(NotificationService::new(NotificationServiceDependencies {
        registry: registry.clone(),
        router: message_router.clone(),
        notifications: notification_rows,
        purchases: purchases.clone(),
        clock: clock.clone(),
    }));

    let chat = Arc::new(ChatService::new(ChatServiceDependencies {
        registry: registry.clone(),
        router: message_router.clone(),
        messages,
        users: users.clone(),
        courses: courses.clone(),
        purchases,
        notifications: notifications.clone(),
        history_limit: config.server.history_snapshot_limit,
    }));

    let call = Arc::new(CallService::new(CallServiceDependencies {
        registry: registry.clone(),
        router: message_router.clone(),
        calls,
        users,
        courses,
        notifications: notifications.clone(),
        tokens,
        clock,
    }));

    let state = AppState::new(registry, message_router, chat, notifications, call);
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("信令服务监听: {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("收到退出信号，开始优雅关闭");
        })
        .await?;

    Ok(())
}
