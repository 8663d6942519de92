mod call_service;
mod chat_service;
mod notification_service;

pub use call_service::{CallRequestInput, CallService, CallServiceDependencies};
pub use chat_service::{ChatService, ChatServiceDependencies, IncomingMessage};
pub use notification_service::{NotificationService, NotificationServiceDependencies};

#[cfg(test)]
mod call_service_tests;
#[cfg(test)]
mod notification_service_tests;
#[cfg(test)]
pub(crate) mod test_support;
