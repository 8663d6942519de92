use std::sync::Arc;

use application::{CallService, ChatService, ConnectionRegistry, MessageRouter, NotificationService};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub chat: Arc<ChatService>,
    pub notifications: Arc<NotificationService>,
    pub call: Arc<CallService>,
}

impl AppState {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        router: Arc<MessageRouter>,
        chat: Arc<ChatService>,
        notifications: Arc<NotificationService>,
        call: Arc<CallService>,
    ) -> Self {
        Self {
            registry,
            router,
            chat,
            notifications,
            call,
        }
    }
}
