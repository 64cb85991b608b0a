mod common;

use schoolhub_api::{
    error::AppError,
    models::attendance::{AttendanceEntry, AttendanceStatus},
    services::attendance::AttendanceService,
    store::{AttendanceFilter, MemoryStore, SchoolStore},
};
use uuid::Uuid;

use common::{add_student, admin, date, teacher};

fn entry(student_id: Uuid, day: u32, status: AttendanceStatus) -> AttendanceEntry {
    AttendanceEntry {
        student_id,
        date: date(2025, 9, day),
        status,
        remarks: None,
    }
}

#[tokio::test]
async fn re_marking_a_day_overwrites_the_status() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "6", "B").await;

    AttendanceService::mark(&store, &admin, &[entry(s.id, 1, AttendanceStatus::Absent)])
        .await
        .unwrap();
    AttendanceService::mark(&store, &admin, &[entry(s.id, 1, AttendanceStatus::Late)])
        .await
        .unwrap();

    let rows = store
        .list_attendance(&AttendanceFilter::on(date(2025, 9, 1)))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, AttendanceStatus::Late);
    assert_eq!(rows[0].marked_by, Some(admin.user_id));
}

#[tokio::test]
async fn duplicate_rows_in_one_batch_keep_the_last() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "6", "B").await;

    let stored = AttendanceService::mark(
        &store,
        &admin,
        &[
            entry(s.id, 2, AttendanceStatus::Present),
            entry(s.id, 2, AttendanceStatus::Excused),
        ],
    )
    .await
    .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, AttendanceStatus::Excused);
}

#[tokio::test]
async fn empty_batch_asks_for_a_selection() {
    let store = MemoryStore::new();
    match AttendanceService::mark(&store, &admin(), &[]).await {
        Err(AppError::Validation { message, .. }) => {
            assert_eq!(message, "Select class/section/date first")
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn marking_another_class_is_denied_and_writes_nothing() {
    let store = MemoryStore::new();
    let mine = add_student(&store, "1", "6", "B").await;
    let other = add_student(&store, "1", "7", "A").await;
    let t = teacher(&[("6", "B")]);

    let err = AttendanceService::mark(
        &store,
        &t,
        &[
            entry(mine.id, 3, AttendanceStatus::Present),
            entry(other.id, 3, AttendanceStatus::Present),
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
    assert!(store
        .list_attendance(&AttendanceFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn range_summary_is_inclusive() {
    use AttendanceStatus::*;
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "6", "B").await;

    let statuses = [Present, Present, Present, Present, Present, Present, Late, Late, Absent, Excused];
    let entries: Vec<_> = statuses
        .iter()
        .enumerate()
        .map(|(i, st)| entry(s.id, i as u32 + 1, *st))
        .collect();
    AttendanceService::mark(&store, &admin, &entries).await.unwrap();
    // Outside the range below.
    AttendanceService::mark(&store, &admin, &[entry(s.id, 20, Absent)])
        .await
        .unwrap();

    let summary = AttendanceService::by_student_range(
        &store,
        &admin,
        s.id,
        date(2025, 9, 1),
        date(2025, 9, 10),
        true,
    )
    .await
    .unwrap();
    assert_eq!(summary.total_days, 10);
    assert_eq!(summary.present_days, 6);
    assert_eq!(summary.late_count, 2);
    assert_eq!(summary.absent_days, 1);
    assert_eq!(summary.excused_count, 1);
    assert_eq!(summary.percentage, 80.0);

    let strict = AttendanceService::by_student_range(
        &store,
        &admin,
        s.id,
        date(2025, 9, 1),
        date(2025, 9, 10),
        false,
    )
    .await
    .unwrap();
    assert_eq!(strict.percentage, 60.0);

    let err = AttendanceService::by_student_range(
        &store,
        &admin,
        s.id,
        date(2025, 9, 10),
        date(2025, 9, 1),
        true,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn register_and_daily_breakdown() {
    let store = MemoryStore::new();
    let admin = admin();
    let a = add_student(&store, "1", "6", "B").await;
    let b = add_student(&store, "2", "6", "B").await;
    let c = add_student(&store, "1", "10", "A").await;

    AttendanceService::mark(
        &store,
        &admin,
        &[
            entry(a.id, 4, AttendanceStatus::Present),
            entry(c.id, 4, AttendanceStatus::Absent),
        ],
    )
    .await
    .unwrap();

    let register = AttendanceService::class_register(&store, &admin, "6", "B", date(2025, 9, 4))
        .await
        .unwrap();
    assert_eq!(register.len(), 2);
    assert_eq!(register[0].student_id, a.id);
    assert_eq!(register[0].status, Some(AttendanceStatus::Present));
    assert_eq!(register[1].student_id, b.id);
    assert_eq!(register[1].status, None);

    let day = AttendanceService::daily_breakdown(&store, &admin, date(2025, 9, 4), true)
        .await
        .unwrap();
    assert_eq!(day.overall.total, 2);
    assert_eq!(day.rate, 50.0);
    assert_eq!(day.by_class["6"].present, 1);
    assert_eq!(day.by_class["10"].absent, 1);

    // A teacher of 6-B only sees their class.
    let t = teacher(&[("6", "B")]);
    let day = AttendanceService::daily_breakdown(&store, &t, date(2025, 9, 4), true)
        .await
        .unwrap();
    assert_eq!(day.overall.total, 1);
    assert_eq!(day.rate, 100.0);
    assert!(!day.by_class.contains_key("10"));
}
