//! 通话信令单元测试

use domain::{CourseId, CourseSummary, NotificationKind, UserId, UserProfile, UserRole};
use uuid::Uuid;

use crate::events::ServerEvent;
use crate::services::call_service::CallRequestInput;
use crate::services::test_support::{drain, TestHarness};

struct CallFixture {
    tutor: UserProfile,
    student: UserProfile,
    course: CourseSummary,
}

async fn seed(h: &TestHarness) -> CallFixture {
    let tutor = UserProfile {
        id: UserId::new(Uuid::new_v4()),
        name: "Tutor Tina".to_string(),
        role: UserRole::Tutor,
    };
    let student = UserProfile {
        id: UserId::new(Uuid::new_v4()),
        name: "Student Sam".to_string(),
        role: UserRole::Student,
    };
    let course = CourseSummary {
        id: CourseId::new(Uuid::new_v4()),
        title: "Rust 101".to_string(),
        tutor_id: tutor.id,
    };
    h.users.insert(tutor.clone()).await;
    h.users.insert(student.clone()).await;
    h.courses.insert(course.clone()).await;
    CallFixture {
        tutor,
        student,
        course,
    }
}

fn request_input(f: &CallFixture) -> CallRequestInput {
    CallRequestInput {
        room_id: "call-room-1".to_string(),
        student_id: f.student.id,
        course_id: f.course.id,
        course_title: f.course.title.clone(),
        tutor_id: f.tutor.id,
        timestamp: "2026-02-01T15:00:00Z".to_string(),
        caller_name: f.student.name.clone(),
    }
}

#[tokio::test]
async fn offline_tutor_still_persists_request() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (caller_conn, mut caller_rx) = h.connect().await;
    h.call.request(caller_conn, request_input(&f)).await.unwrap();

    // 发起方收到错误提示，不重试不排队
    let events = drain(&mut caller_rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::Error { .. })));

    // 通话记录和通知记录各恰好一条
    let records = h.call_rows.all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tutor_id, f.tutor.id);
    assert_eq!(records[0].course_name, "Rust 101");

    let rows = h.notification_rows.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, f.tutor.id);
    assert_eq!(rows[0].kind, NotificationKind::CallRequest);
}

#[tokio::test]
async fn connected_tutor_receives_request_with_record_id() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (caller_conn, _caller_rx) = h.connect().await;
    let (tutor_conn, mut tutor_rx) = h.connect().await;
    h.chat.join_user(tutor_conn, f.tutor.id).await.unwrap();
    drain(&mut tutor_rx);

    h.call.request(caller_conn, request_input(&f)).await.unwrap();

    let requests: Vec<_> = drain(&mut tutor_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::CallRequest { .. }))
        .collect();
    assert_eq!(requests.len(), 1);

    let records = h.call_rows.all().await;
    match &requests[0] {
        ServerEvent::CallRequest {
            call_id,
            room_id,
            caller_name,
            ..
        } => {
            assert_eq!(*call_id, records[0].id);
            assert_eq!(room_id, "call-room-1");
            assert_eq!(caller_name, "Student Sam");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn unknown_course_is_a_lookup_error() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (conn, _rx) = h.connect().await;
    let mut input = request_input(&f);
    input.course_id = CourseId::new(Uuid::new_v4());

    assert!(h.call.request(conn, input).await.is_err());
    assert!(h.call_rows.all().await.is_empty());
}

#[tokio::test]
async fn accept_issues_tokens_and_overwrites_start_time() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (student_conn, mut student_rx) = h.connect().await;
    let (tutor_conn, mut tutor_rx) = h.connect().await;
    h.chat.join_user(student_conn, f.student.id).await.unwrap();
    h.chat.join_user(tutor_conn, f.tutor.id).await.unwrap();

    h.call.request(student_conn, request_input(&f)).await.unwrap();
    let record = h.call_rows.all().await.remove(0);
    let requested_at = record.start_time;
    drain(&mut student_rx);
    drain(&mut tutor_rx);

    h.clock.advance_secs(20);
    h.call
        .accept(record.id, "call-room-1".to_string(), f.student.id, f.tutor.id)
        .await
        .unwrap();

    // 双方各收到一份只属于自己的令牌，对端字段互指
    let student_started = drain(&mut student_rx)
        .into_iter()
        .find_map(|e| match e {
            ServerEvent::VideoCallStarted {
                token, partner_id, ..
            } => Some((token, partner_id)),
            _ => None,
        })
        .expect("student token");
    let tutor_started = drain(&mut tutor_rx)
        .into_iter()
        .find_map(|e| match e {
            ServerEvent::VideoCallStarted {
                token, partner_id, ..
            } => Some((token, partner_id)),
            _ => None,
        })
        .expect("tutor token");

    assert_ne!(student_started.0, tutor_started.0);
    assert_eq!(student_started.1, f.tutor.id);
    assert_eq!(tutor_started.1, f.student.id);

    // start_time 被接受时刻覆盖（字段语义：通话确认时间）
    let updated = h.call_rows.all().await.remove(0);
    assert!(updated.start_time > requested_at);

    // 原始请求通知被标记为已读
    let rows = h.notification_rows.all().await;
    let request_row = rows
        .iter()
        .find(|n| n.kind == NotificationKind::CallRequest)
        .expect("request notification");
    assert!(request_row.read);
}

#[tokio::test]
async fn accept_with_offline_partner_does_not_fail() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (student_conn, _student_rx) = h.connect().await;
    h.chat.join_user(student_conn, f.student.id).await.unwrap();
    h.call.request(student_conn, request_input(&f)).await.unwrap();
    let record = h.call_rows.all().await.remove(0);

    // 导师从未上线：令牌投递被跳过，整个握手不报错
    h.call
        .accept(record.id, "call-room-1".to_string(), f.student.id, f.tutor.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn reject_notifies_counterpart() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (student_conn, mut student_rx) = h.connect().await;
    h.chat.join_user(student_conn, f.student.id).await.unwrap();
    drain(&mut student_rx);

    let call_id = domain::CallId::new(Uuid::new_v4());
    h.call
        .reject_call(f.student.id, call_id, f.tutor.name.clone(), f.tutor.id)
        .await
        .unwrap();

    let events = drain(&mut student_rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::CallRejected { .. })));

    let rows = h.notification_rows.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, f.student.id);
    assert_eq!(rows[0].kind, NotificationKind::Rejection);
}

#[tokio::test]
async fn join_video_call_notifies_room() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (first_conn, mut first_rx) = h.connect().await;
    let (second_conn, mut second_rx) = h.connect().await;

    h.call
        .join_video_call(first_conn, "call-room-9".to_string(), f.tutor.id, "host".to_string())
        .await
        .unwrap();
    drain(&mut first_rx);

    h.call
        .join_video_call(
            second_conn,
            "call-room-9".to_string(),
            f.student.id,
            "audience".to_string(),
        )
        .await
        .unwrap();

    // 已在房间内的参与者也会被告知有人加入
    assert!(drain(&mut first_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::VideoCallJoined { .. })));
    assert!(drain(&mut second_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::VideoCallJoined { .. })));
}

#[tokio::test]
async fn end_call_reaches_counterpart_socket_only() {
    let h = TestHarness::new();
    let f = seed(&h).await;

    let (tutor_conn, mut tutor_rx) = h.connect().await;
    h.chat.join_user(tutor_conn, f.tutor.id).await.unwrap();
    drain(&mut tutor_rx);

    let call_id = domain::CallId::new(Uuid::new_v4());
    h.call.end_call(f.tutor.id, call_id).await.unwrap();

    assert!(drain(&mut tutor_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::CallEnded { .. })));

    // 对离线用户结束通话是正常分支
    h.call.end_call(f.student.id, call_id).await.unwrap();
}
