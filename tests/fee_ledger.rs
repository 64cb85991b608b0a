mod common;

use schoolhub_api::{
    error::AppError,
    models::fee::{CreateDueRequest, FeeStatus},
    services::fees::{self, FeeService},
    store::{FeeFilter, MemoryStore, SchoolStore, StoreError},
};
use uuid::Uuid;

use common::{add_student, admin, date, teacher};

fn due_request(student_ids: Vec<Uuid>, fee_type: &str, amount: f64) -> CreateDueRequest {
    CreateDueRequest {
        student_ids,
        fee_type: fee_type.into(),
        amount,
        due_date: date(2025, 7, 10),
        academic_year: "2025-26".into(),
        term: "Term 1".into(),
    }
}

#[tokio::test]
async fn partial_then_full_payment_keeps_ledger_balanced() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "8", "A").await;

    let dues = FeeService::create_due(&store, &admin, &due_request(vec![s.id], "tuition", 1000.0))
        .await
        .unwrap();
    let due_id = dues[0].id;

    let first = FeeService::record_payment(&store, &admin, due_id, 400.0, date(2025, 7, 1))
        .await
        .unwrap();
    assert_eq!(first.status, FeeStatus::Paid);
    assert_eq!(first.amount, 400.0);
    assert_eq!(first.parent_fee_id, Some(due_id));

    let due = store.get_fee(due_id).await.unwrap().unwrap();
    assert_eq!(due.status, FeeStatus::PartiallyPaid);
    assert_eq!(due.amount, 600.0);

    let check = FeeService::verify_ledger(&store, &admin, due_id).await.unwrap();
    assert!(check.balanced);
    assert_eq!(check.paid_total, 400.0);
    assert_eq!(check.remaining, 600.0);

    FeeService::record_payment(&store, &admin, due_id, 600.0, date(2025, 7, 5))
        .await
        .unwrap();
    let due = store.get_fee(due_id).await.unwrap().unwrap();
    assert_eq!(due.status, FeeStatus::Paid);
    assert_eq!(due.amount, 0.0);
    assert_eq!(due.paid_date, Some(date(2025, 7, 5)));

    let payments = store
        .list_fees(&FeeFilter {
            parent_fee_id: Some(due_id),
            ..Default::default()
        })
        .await
        .unwrap();
    let paid: f64 = payments.iter().map(|p| p.amount).sum();
    assert_eq!(paid, 1000.0);

    let check = FeeService::verify_ledger(&store, &admin, due_id).await.unwrap();
    assert!(check.balanced);
    assert_eq!(check.remaining, 0.0);

    let history = FeeService::payment_history(&store, &admin, s.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].paid_date, Some(date(2025, 7, 5)));

    assert!(FeeService::list_outstanding(&store, &admin, s.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn payment_against_settled_due_is_rejected() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "8", "A").await;
    let dues = FeeService::create_due(&store, &admin, &due_request(vec![s.id], "tuition", 500.0))
        .await
        .unwrap();

    FeeService::record_payment(&store, &admin, dues[0].id, 500.0, date(2025, 7, 1))
        .await
        .unwrap();
    let err = FeeService::record_payment(&store, &admin, dues[0].id, 10.0, date(2025, 7, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }), "{err:?}");

    let err = FeeService::record_payment(&store, &admin, Uuid::new_v4(), 10.0, date(2025, 7, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn overpayment_closes_due_and_shows_in_reconciliation() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "8", "A").await;
    let dues = FeeService::create_due(&store, &admin, &due_request(vec![s.id], "transport", 300.0))
        .await
        .unwrap();

    FeeService::record_payment(&store, &admin, dues[0].id, 350.0, date(2025, 7, 1))
        .await
        .unwrap();
    let due = store.get_fee(dues[0].id).await.unwrap().unwrap();
    assert_eq!(due.status, FeeStatus::Paid);
    assert_eq!(due.amount, 0.0);

    let check = FeeService::verify_ledger(&store, &admin, dues[0].id).await.unwrap();
    assert!(!check.balanced);
    assert_eq!(check.paid_total, 350.0);
}

#[tokio::test]
async fn due_creation_validates_input() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "1", "8", "A").await;

    for req in [
        due_request(vec![], "tuition", 100.0),
        due_request(vec![s.id], "tuition", 0.0),
        due_request(vec![s.id], "  ", 100.0),
    ] {
        let err = FeeService::create_due(&store, &admin, &req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "{err:?}");
    }
    assert!(store.list_fees(&FeeFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn class_dues_cover_every_student_and_skip_paid_rows() {
    let store = MemoryStore::new();
    let admin = admin();
    let a = add_student(&store, "1", "8", "A").await;
    let b = add_student(&store, "2", "8", "A").await;
    let c = add_student(&store, "3", "8", "A").await;
    add_student(&store, "1", "8", "B").await;

    FeeService::create_due(&store, &admin, &due_request(vec![a.id, b.id], "tuition", 1000.0))
        .await
        .unwrap();
    let bus = FeeService::create_due(&store, &admin, &due_request(vec![a.id], "transport", 250.0))
        .await
        .unwrap();
    FeeService::record_payment(&store, &admin, bus[0].id, 250.0, date(2025, 7, 1))
        .await
        .unwrap();
    let b_dues = FeeService::list_outstanding(&store, &admin, b.id).await.unwrap();
    FeeService::record_payment(&store, &admin, b_dues[0].id, 300.0, date(2025, 7, 1))
        .await
        .unwrap();

    let totals = FeeService::due_totals_by_class(&store, &admin, "8", "A").await.unwrap();
    let total_of = |id: Uuid| totals.iter().find(|t| t.student_id == id).unwrap().total_due;
    assert_eq!(totals.len(), 3);
    assert_eq!(total_of(a.id), 1000.0);
    assert_eq!(total_of(b.id), 700.0);
    assert_eq!(total_of(c.id), 0.0);

    let stats = FeeService::collection_summary(&store, &admin).await.unwrap();
    assert_eq!(stats.collected, 550.0);
    assert_eq!(stats.pending, 1700.0);
    assert_eq!(stats.rate, 24.4);
    assert_eq!(stats.by_category["transport"].collected, 250.0);
}

#[tokio::test]
async fn teachers_cannot_touch_fees_outside_their_classes() {
    let store = MemoryStore::new();
    let s = add_student(&store, "1", "9", "C").await;
    let dues = FeeService::create_due(&store, &admin(), &due_request(vec![s.id], "tuition", 100.0))
        .await
        .unwrap();

    let t = teacher(&[("8", "A")]);
    let err = FeeService::record_payment(&store, &t, dues[0].id, 50.0, date(2025, 7, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
    let err = FeeService::due_totals_by_class(&store, &t, "9", "C").await.unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));

    let due = store.get_fee(dues[0].id).await.unwrap().unwrap();
    assert_eq!(due.status, FeeStatus::Pending);
}

#[tokio::test]
async fn concurrent_payments_from_the_same_read_do_not_both_land() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "5", "8", "A").await;
    let due_id = FeeService::create_due(&store, &admin, &due_request(vec![s.id], "tuition", 1000.0))
        .await
        .unwrap()[0]
        .id;

    let read_a = store.get_fee(due_id).await.unwrap().unwrap();
    let read_b = store.get_fee(due_id).await.unwrap().unwrap();
    let a = fees::apply_payment(&read_a, 400.0, date(2025, 7, 1)).unwrap();
    let b = fees::apply_payment(&read_b, 400.0, date(2025, 7, 1)).unwrap();

    store.apply_payment(&read_a, a.due, a.payment).await.unwrap();
    assert!(matches!(
        store.apply_payment(&read_b, b.due, b.payment).await,
        Err(StoreError::Stale(id)) if id == due_id
    ));

    let check = FeeService::verify_ledger(&store, &admin, due_id).await.unwrap();
    assert!(check.balanced);
    assert_eq!(check.paid_total, 400.0);
    assert_eq!(check.remaining, 600.0);
}

#[tokio::test]
async fn second_full_payment_on_a_settled_due_is_rejected() {
    let store = MemoryStore::new();
    let admin = admin();
    let s = add_student(&store, "6", "8", "A").await;
    let due_id = FeeService::create_due(&store, &admin, &due_request(vec![s.id], "transport", 300.0))
        .await
        .unwrap()[0]
        .id;

    let stale = store.get_fee(due_id).await.unwrap().unwrap();
    FeeService::record_payment(&store, &admin, due_id, 300.0, date(2025, 7, 1))
        .await
        .unwrap();

    let replay = fees::apply_payment(&stale, 300.0, date(2025, 7, 1)).unwrap();
    assert!(matches!(
        store.apply_payment(&stale, replay.due, replay.payment).await,
        Err(StoreError::Stale(_))
    ));
    let history = FeeService::payment_history(&store, &admin, s.id).await.unwrap();
    assert_eq!(history.len(), 1);
}
