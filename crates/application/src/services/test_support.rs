//! 服务层测试的公共接线
//!
//! 每个用例拿到一套独立的注册表/路由器/内存仓库，互不串扰。

use std::sync::Arc;
use std::sync::Mutex;

use config::MediaConfig;
use domain::{ConnectionId, Timestamp};
use infrastructure::{
    InMemoryCallRecordRepository, InMemoryCourseDirectory, InMemoryMessageRepository,
    InMemoryNotificationRepository, InMemoryPurchaseLedger, InMemoryUserDirectory,
};
use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::events::ServerEvent;
use crate::media_token::HmacMediaTokenIssuer;
use crate::registry::ConnectionRegistry;
use crate::router::MessageRouter;
use crate::services::{
    CallService, CallServiceDependencies, ChatService, ChatServiceDependencies,
    NotificationService, NotificationServiceDependencies,
};

/// 可手动推进的测试时钟
pub(crate) struct TestClock {
    now: Mutex<Timestamp>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(chrono::Utc::now()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

pub(crate) struct TestHarness {
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub clock: Arc<TestClock>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub notification_rows: Arc<InMemoryNotificationRepository>,
    pub call_rows: Arc<InMemoryCallRecordRepository>,
    pub users: Arc<InMemoryUserDirectory>,
    pub courses: Arc<InMemoryCourseDirectory>,
    pub purchases: Arc<InMemoryPurchaseLedger>,
    pub notifications: Arc<NotificationService>,
    pub chat: ChatService,
    pub call: CallService,
}

impl TestHarness {
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(MessageRouter::new(registry.clone()));
        let clock = Arc::new(TestClock::new());

        let messages = Arc::new(InMemoryMessageRepository::new());
        let notification_rows = Arc::new(InMemoryNotificationRepository::new());
        let call_rows = Arc::new(InMemoryCallRecordRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let courses = Arc::new(InMemoryCourseDirectory::new());
        let purchases = Arc::new(InMemoryPurchaseLedger::new());

        let notifications = Arc::new(NotificationService::new(NotificationServiceDependencies {
            registry: registry.clone(),
            router: router.clone(),
            notifications: notification_rows.clone(),
            purchases: purchases.clone(),
            clock: clock.clone(),
        }));

        let chat = ChatService::new(ChatServiceDependencies {
            registry: registry.clone(),
            router: router.clone(),
            messages: messages.clone(),
            users: users.clone(),
            courses: courses.clone(),
            purchases: purchases.clone(),
            notifications: notifications.clone(),
            history_limit: 50,
        });

        let tokens = Arc::new(HmacMediaTokenIssuer::new(&MediaConfig {
            app_id: "edulink-test".to_string(),
            app_secret: Some("test-secret".to_string()),
            token_ttl_secs: 600,
        }));

        let call = CallService::new(CallServiceDependencies {
            registry: registry.clone(),
            router: router.clone(),
            calls: call_rows.clone(),
            users: users.clone(),
            courses: courses.clone(),
            notifications: notifications.clone(),
            tokens,
            clock: clock.clone(),
        });

        Self {
            registry,
            router,
            clock,
            messages,
            notification_rows,
            call_rows,
            users,
            courses,
            purchases,
            notifications,
            chat,
            call,
        }
    }

    /// 模拟一条客户端连接：注册到注册表和路由器，返回接收端
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let connection_id = ConnectionId::generate();
        self.registry.on_connect(connection_id).await;
        let (tx, rx) = mpsc::unbounded_channel();
        self.router.register_sender(connection_id, tx).await;
        (connection_id, rx)
    }
}

/// 取出接收端里当前积压的全部事件
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
