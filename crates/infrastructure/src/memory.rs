//! 领域接口的内存实现
//!
//! 与 PostgreSQL 实现遵循同一契约，供测试与本地开发接线使用。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    CallId, CallRecord, CallRecordRepository, ChatMessage, CommunityId, CourseDirectory,
    CourseId, CourseSummary, DomainError, DomainResult, MessageId, MessageRepository,
    MessageStatus, Notification, NotificationId, NotificationKind, NotificationRepository,
    PrivateChatId, Purchase, PurchaseLedger, Timestamp, UserDirectory, UserId, UserProfile,
};
use tokio::sync::RwLock;

/// 内存消息仓库
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<ChatMessage>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 测试辅助：当前全部消息
    pub async fn all(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: &ChatMessage) -> DomainResult<ChatMessage> {
        self.messages.write().await.push(message.clone());
        Ok(message.clone())
    }

    async fn set_status(&self, id: MessageId, status: MessageStatus) -> DomainResult<()> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::resource_not_found("message", id.to_string()))?;
        message.status = status;
        Ok(())
    }

    async fn recent_by_community(
        &self,
        community_id: CommunityId,
        limit: u32,
    ) -> DomainResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut matching: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.community_id == Some(community_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let skip = matching.len().saturating_sub(limit as usize);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn recent_by_private_chat(
        &self,
        key: &PrivateChatId,
        limit: u32,
    ) -> DomainResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut matching: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.private_chat_id.as_ref() == Some(key))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let skip = matching.len().saturating_sub(limit as usize);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn latest_per_private_chat(&self, tutor_id: UserId) -> DomainResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut latest: HashMap<PrivateChatId, ChatMessage> = HashMap::new();
        for message in messages.iter() {
            let Some(key) = message.private_chat_id else {
                continue;
            };
            if key.tutor_id != tutor_id {
                continue;
            }
            match latest.get(&key) {
                Some(existing) if existing.timestamp >= message.timestamp => {}
                _ => {
                    latest.insert(key, message.clone());
                }
            }
        }
        Ok(latest.into_values().collect())
    }
}

/// 内存通知仓库
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    rows: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 测试辅助：当前全部通知
    pub async fn all(&self) -> Vec<Notification> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> DomainResult<Notification> {
        self.rows.write().await.push(notification.clone());
        Ok(notification.clone())
    }

    async fn mark_as_read(&self, notification_id: NotificationId) -> DomainResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| {
                DomainError::resource_not_found("notification", notification_id.to_string())
            })?;
        row.mark_as_read();
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: UserId) -> DomainResult<u64> {
        let mut rows = self.rows.write().await;
        let mut updated = 0u64;
        for row in rows.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            row.mark_as_read();
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_call_requests_read(
        &self,
        user_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> DomainResult<u64> {
        let mut rows = self.rows.write().await;
        let mut updated = 0u64;
        for row in rows.iter_mut().filter(|n| {
            n.user_id == user_id
                && n.kind == NotificationKind::CallRequest
                && n.course_id == Some(course_id)
                && n.student_id == Some(student_id)
                && !n.read
        }) {
            row.mark_as_read();
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_unread_chat_messages(
        &self,
        tutor_id: UserId,
        course_id: CourseId,
        student_id: UserId,
    ) -> DomainResult<u64> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|n| {
                n.user_id == tutor_id
                    && n.kind == NotificationKind::ChatMessage
                    && n.course_id == Some(course_id)
                    && n.student_id == Some(student_id)
                    && !n.read
            })
            .count() as u64)
    }
}

/// 内存通话记录仓库
#[derive(Default)]
pub struct InMemoryCallRecordRepository {
    rows: RwLock<Vec<CallRecord>>,
}

impl InMemoryCallRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 测试辅助：当前全部通话记录
    pub async fn all(&self) -> Vec<CallRecord> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl CallRecordRepository for InMemoryCallRecordRepository {
    async fn create(&self, record: &CallRecord) -> DomainResult<CallRecord> {
        self.rows.write().await.push(record.clone());
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: CallId) -> DomainResult<Option<CallRecord>> {
        Ok(self.rows.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn set_start_time(&self, id: CallId, start_time: Timestamp) -> DomainResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::resource_not_found("call", id.to_string()))?;
        row.start_time = start_time;
        Ok(())
    }
}

/// 内存用户目录
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.users.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

/// 内存课程目录
#[derive(Default)]
pub struct InMemoryCourseDirectory {
    courses: RwLock<HashMap<CourseId, CourseSummary>>,
}

impl InMemoryCourseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, course: CourseSummary) {
        self.courses.write().await.insert(course.id, course);
    }
}

#[async_trait]
impl CourseDirectory for InMemoryCourseDirectory {
    async fn find_by_id(&self, id: CourseId) -> DomainResult<Option<CourseSummary>> {
        Ok(self.courses.read().await.get(&id).cloned())
    }
}

/// 内存购买记录
#[derive(Default)]
pub struct InMemoryPurchaseLedger {
    /// 社区到课程的映射
    communities: RwLock<HashMap<CommunityId, CourseId>>,
    /// 课程归属（生产实现里这是 courses 表的 JOIN）
    course_tutors: RwLock<HashMap<CourseId, UserId>>,
    /// 已完成的购买
    purchases: RwLock<Vec<Purchase>>,
}

impl InMemoryPurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn map_community(&self, community_id: CommunityId, course_id: CourseId) {
        self.communities
            .write()
            .await
            .insert(community_id, course_id);
    }

    pub async fn map_course_tutor(&self, course_id: CourseId, tutor_id: UserId) {
        self.course_tutors.write().await.insert(course_id, tutor_id);
    }

    pub async fn add_purchase(&self, course_id: CourseId, student_id: UserId) {
        self.purchases.write().await.push(Purchase {
            course_id,
            student_id,
        });
    }
}

#[async_trait]
impl PurchaseLedger for InMemoryPurchaseLedger {
    async fn students_of_community(
        &self,
        community_id: CommunityId,
    ) -> DomainResult<Vec<UserId>> {
        let communities = self.communities.read().await;
        let Some(course_id) = communities.get(&community_id).copied() else {
            return Ok(Vec::new());
        };
        let purchases = self.purchases.read().await;
        Ok(purchases
            .iter()
            .filter(|p| p.course_id == course_id)
            .map(|p| p.student_id)
            .collect())
    }

    async fn purchases_by_tutor(&self, tutor_id: UserId) -> DomainResult<Vec<Purchase>> {
        let course_tutors = self.course_tutors.read().await;
        let purchases = self.purchases.read().await;
        Ok(purchases
            .iter()
            .filter(|p| course_tutors.get(&p.course_id) == Some(&tutor_id))
            .copied()
            .collect())
    }
}
