pub mod call_record;
pub mod directory;
pub mod message;
pub mod notification;

pub use call_record::CallRecord;
pub use directory::{CourseSummary, Purchase, UserProfile, UserRole};
pub use message::{ChatMessage, MessageStatus};
pub use notification::{Notification, NotificationKind};
