//! 通知分发单元测试

use domain::{CommunityId, CourseId, Notification, NotificationKind, RoomId, UserId};
use uuid::Uuid;

use crate::events::ServerEvent;
use crate::services::test_support::{drain, TestHarness};

#[tokio::test]
async fn targeted_notify_persists_and_pushes_when_online() {
    let h = TestHarness::new();
    let user = UserId::new(Uuid::new_v4());

    let (conn, mut rx) = h.connect().await;
    h.registry.bind_user(conn, user).await;
    h.registry.join_room(conn, RoomId::inbox(user)).await;

    h.notifications
        .notify(Notification::new(
            user,
            NotificationKind::Approval,
            "Your course was approved".to_string(),
            h.notifications.now(),
        ))
        .await
        .unwrap();

    assert_eq!(h.notification_rows.all().await.len(), 1);
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::Notification(n) if n.user_id == user)));
}

#[tokio::test]
async fn targeted_notify_to_offline_user_only_persists() {
    let h = TestHarness::new();
    let user = UserId::new(Uuid::new_v4());

    h.notifications
        .notify(Notification::new(
            user,
            NotificationKind::Approval,
            "offline".to_string(),
            h.notifications.now(),
        ))
        .await
        .unwrap();

    // 记录保留，等 REST 层拉取；信令层不排队
    let rows = h.notification_rows.all().await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].read);
}

#[tokio::test]
async fn community_broadcast_excludes_sender_and_pings_room() {
    let h = TestHarness::new();
    let community = CommunityId::new(Uuid::new_v4());
    let course = CourseId::new(Uuid::new_v4());
    let sender = UserId::new(Uuid::new_v4());
    let member_a = UserId::new(Uuid::new_v4());
    let member_b = UserId::new(Uuid::new_v4());

    h.purchases.map_community(community, course).await;
    for student in [sender, member_a, member_b] {
        h.purchases.add_purchase(course, student).await;
    }

    // member_a 在线并加入了社区房间
    let (conn, mut rx) = h.connect().await;
    h.registry.bind_user(conn, member_a).await;
    h.registry.join_room(conn, RoomId::inbox(member_a)).await;
    h.registry.join_room(conn, RoomId::community(community)).await;

    let created = h
        .notifications
        .broadcast_community(
            community,
            "Rust 101".to_string(),
            "new message in community".to_string(),
            sender,
        )
        .await
        .unwrap();

    // 发送者被排除：两条独立记录，不是共享一条
    assert_eq!(created, 2);
    let rows = h.notification_rows.all().await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|n| n.user_id != sender));
    assert!(rows.iter().all(|n| n.community_id == Some(community)));

    // 在线成员收到持久通知和房间级轻量提示两层事件
    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::Notification(n) if n.user_id == member_a)));
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::ReceiveNotification(p) if p.sender_id == sender)));
}

#[tokio::test]
async fn mark_read_confirms_to_requesting_socket() {
    let h = TestHarness::new();
    let user = UserId::new(Uuid::new_v4());

    let stored = h
        .notifications
        .notify(Notification::new(
            user,
            NotificationKind::ChatMessage,
            "ping".to_string(),
            h.notifications.now(),
        ))
        .await
        .unwrap();

    let (conn, mut rx) = h.connect().await;
    h.notifications.mark_read(conn, stored.id).await.unwrap();

    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::NotificationRead { notification_id } if *notification_id == stored.id)));
    assert!(h.notification_rows.all().await[0].read);
}

#[tokio::test]
async fn mark_all_read_is_silent() {
    let h = TestHarness::new();
    let user = UserId::new(Uuid::new_v4());

    for i in 0..3 {
        h.notifications
            .notify(Notification::new(
                user,
                NotificationKind::ChatMessage,
                format!("n{}", i),
                h.notifications.now(),
            ))
            .await
            .unwrap();
    }

    let (conn, mut rx) = h.connect().await;
    h.registry.bind_user(conn, user).await;
    h.registry.join_room(conn, RoomId::inbox(user)).await;
    drain(&mut rx);

    h.notifications.mark_all_read(user).await.unwrap();

    // 批量变体没有任何回发事件；与单条变体的不对称是既有行为
    assert!(drain(&mut rx).is_empty());
    assert!(h.notification_rows.all().await.iter().all(|n| n.read));
}
