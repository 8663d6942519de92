pub mod call_record_repository;
pub mod directory;
pub mod message_repository;
pub mod notification_repository;

pub use call_record_repository::CallRecordRepository;
pub use directory::{CourseDirectory, PurchaseLedger, UserDirectory};
pub use message_repository::MessageRepository;
pub use notification_repository::NotificationRepository;
