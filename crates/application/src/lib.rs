//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：连接注册表、房间成员关系、
//! 消息引擎、通知分发和通话信令，以及对外部适配器
//! （时钟、媒体令牌签发）的抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod events;
pub mod media_token;
pub mod registry;
pub mod router;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{CommunityPing, PrivateChatSummary, PrivateMessagePayload};
pub use error::ApplicationError;
pub use events::ServerEvent;
pub use media_token::{HmacMediaTokenIssuer, MediaTokenIssuer, INVALID_TOKEN};
pub use registry::ConnectionRegistry;
pub use router::MessageRouter;
pub use services::{
    CallRequestInput, CallService, CallServiceDependencies, ChatService,
    ChatServiceDependencies, IncomingMessage, NotificationService,
    NotificationServiceDependencies,
};
