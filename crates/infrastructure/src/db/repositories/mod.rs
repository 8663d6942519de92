pub mod call_record_repository_impl;
pub mod directory_impl;
pub mod message_repository_impl;
pub mod notification_repository_impl;

pub use call_record_repository_impl::PostgresCallRecordRepository;
pub use directory_impl::{
    PostgresCourseDirectory, PostgresPurchaseLedger, PostgresUserDirectory,
};
pub use message_repository_impl::PostgresMessageRepository;
pub use notification_repository_impl::PostgresNotificationRepository;
