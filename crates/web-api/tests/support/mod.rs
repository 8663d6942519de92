//! 集成测试接线：内存基础设施 + 真实路由

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use config::MediaConfig;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use application::{
    CallService, CallServiceDependencies, ChatService, ChatServiceDependencies,
    ConnectionRegistry, HmacMediaTokenIssuer, MessageRouter, NotificationService,
    NotificationServiceDependencies, SystemClock,
};
use infrastructure::{
    InMemoryCallRecordRepository, InMemoryCourseDirectory, InMemoryMessageRepository,
    InMemoryNotificationRepository, InMemoryPurchaseLedger, InMemoryUserDirectory,
};
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct TestApp {
    pub router: Router,
    pub messages: Arc<InMemoryMessageRepository>,
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub calls: Arc<InMemoryCallRecordRepository>,
    pub users: Arc<InMemoryUserDirectory>,
    pub courses: Arc<InMemoryCourseDirectory>,
    pub purchases: Arc<InMemoryPurchaseLedger>,
}

/// 用内存实现组装一套完整的信令服务
pub fn build_app() -> TestApp {
    let registry = Arc::new(ConnectionRegistry::new());
    let message_router = Arc::new(MessageRouter::new(registry.clone()));
    let clock = Arc::new(SystemClock);

    let messages = Arc::new(InMemoryMessageRepository::new());
    let notification_rows = Arc::new(InMemoryNotificationRepository::new());
    let calls = Arc::new(InMemoryCallRecordRepository::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let courses = Arc::new(InMemoryCourseDirectory::new());
    let purchases = Arc::new(InMemoryPurchaseLedger::new());

    let notifications = Arc::new(NotificationService::new(NotificationServiceDependencies {
        registry: registry.clone(),
        router: message_router.clone(),
        notifications: notification_rows.clone(),
        purchases: purchases.clone(),
        clock: clock.clone(),
    }));

    let chat = Arc::new(ChatService::new(ChatServiceDependencies {
        registry: registry.clone(),
        router: message_router.clone(),
        messages: messages.clone(),
        users: users.clone(),
        courses: courses.clone(),
        purchases: purchases.clone(),
        notifications: notifications.clone(),
        history_limit: 50,
    }));

    let tokens = Arc::new(HmacMediaTokenIssuer::new(&MediaConfig {
        app_id: "edulink-test".to_string(),
        app_secret: Some("integration-secret".to_string()),
        token_ttl_secs: 600,
    }));

    let call = Arc::new(CallService::new(CallServiceDependencies {
        registry: registry.clone(),
        router: message_router.clone(),
        calls: calls.clone(),
        users: users.clone(),
        courses: courses.clone(),
        notifications: notifications.clone(),
        tokens,
        clock,
    }));

    let state = AppState::new(registry, message_router, chat, notifications, call);

    TestApp {
        router: router(state),
        messages,
        notifications: notification_rows,
        calls,
        users,
        courses,
        purchases,
    }
}

/// 在随机端口上启动服务，返回地址和关闭句柄
pub async fn spawn(router: Router) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    // allow server to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown_tx)
}

/// 建立一条 WebSocket 连接，可选携带 userId 查询参数
pub async fn connect(addr: SocketAddr, user_id: Option<&str>) -> WsClient {
    let url = match user_id {
        Some(user_id) => format!("ws://{}/api/v1/ws?userId={}", addr, user_id),
        None => format!("ws://{}/api/v1/ws", addr),
    };
    let (ws, _) = connect_async(url).await.expect("ws connect");
    ws
}

/// 发送一个 `{"event": ..., "data": ...}` 帧
pub async fn send_event(ws: &mut WsClient, event: &str, data: Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    ws.send(TungsteniteMessage::Text(frame.to_string().into()))
        .await
        .expect("send event");
}

/// 读取下一个文本帧并解析为 JSON，5 秒超时
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for event")
            .expect("ws stream ended")
            .expect("ws message");
        match msg {
            TungsteniteMessage::Text(payload) => {
                return serde_json::from_str(&payload).expect("json")
            }
            TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
            other => panic!("unexpected message {other:?}"),
        }
    }
}

/// 读取事件直到出现给定名称的事件
pub async fn wait_for(ws: &mut WsClient, event: &str) -> Value {
    for _ in 0..20 {
        let value = next_event(ws).await;
        if value["event"] == event {
            return value;
        }
    }
    panic!("event {event} never arrived");
}
