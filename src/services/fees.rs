//! Fee ledger: dues, partial payments and collection figures.
//!
//! A due row keeps its remaining balance in `amount`. Paying against it
//! rewrites that balance and inserts a separate `paid` row as the payment
//! record, both in one store transaction.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        fee::{CollectionStats, CreateDueRequest, Fee, FeeStatus, LedgerCheck, StudentDueTotal},
        student::Student,
        user::Principal,
    },
    services::{
        access::{can_access, ensure_access},
        metrics::{OVERPAYMENTS_COUNTER, PAYMENTS_COUNTER},
        percentage,
    },
    store::{FeeFilter, SchoolStore, StoreError, StudentFilter},
};

/// Money is kept to the cent.
pub fn round_money(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The two rows a payment produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// The due with its new status and remaining balance.
    pub due: Fee,
    /// The `paid` history row.
    pub payment: Fee,
    /// How far the payment exceeded the remaining balance, if it did.
    pub overpaid_by: Option<f64>,
}

/// Applies `payment_amount` to an open due without touching the store.
pub fn apply_payment(due: &Fee, payment_amount: f64, today: NaiveDate) -> Result<PaymentOutcome> {
    let payment_amount = if payment_amount.is_finite() {
        round_money(payment_amount)
    } else {
        0.0
    };
    if payment_amount <= 0.0 {
        return Err(AppError::validation("amount", "Payment amount must be at least 0.01"));
    }
    if !due.status.is_outstanding() {
        return Err(AppError::validation(
            "fee_id",
            format!("Fee is already {}, nothing left to pay", due.status),
        ));
    }

    let now = Utc::now();
    let remaining = round_money(due.amount - payment_amount);
    let mut updated = due.clone();
    updated.updated_at = now;

    let overpaid_by = if remaining <= 0.0 {
        updated.status = FeeStatus::Paid;
        updated.amount = 0.0;
        updated.paid_date = Some(today);
        (remaining < 0.0).then_some(-remaining)
    } else {
        updated.status = FeeStatus::PartiallyPaid;
        updated.amount = remaining;
        None
    };

    let payment = Fee {
        id: Uuid::new_v4(),
        student_id: due.student_id,
        fee_type: due.fee_type.clone(),
        amount: payment_amount,
        original_amount: payment_amount,
        due_date: due.due_date,
        academic_year: due.academic_year.clone(),
        term: due.term.clone(),
        status: FeeStatus::Paid,
        paid_date: Some(today),
        parent_fee_id: Some(due.id),
        created_at: now,
        updated_at: now,
    };

    Ok(PaymentOutcome {
        due: updated,
        payment,
        overpaid_by,
    })
}

/// Collected vs outstanding totals, overall and per fee type.
pub fn collection_stats(fees: &[Fee]) -> CollectionStats {
    let mut stats = CollectionStats::default();
    for fee in fees {
        let bucket = stats.by_category.entry(fee.fee_type.clone()).or_default();
        match fee.status {
            FeeStatus::Paid => {
                stats.collected += fee.amount;
                bucket.collected += fee.amount;
            }
            FeeStatus::Pending | FeeStatus::PartiallyPaid => {
                stats.pending += fee.amount;
                bucket.pending += fee.amount;
            }
        }
    }
    stats.collected = round_money(stats.collected);
    stats.pending = round_money(stats.pending);
    stats.rate = percentage(stats.collected, stats.collected + stats.pending);
    stats
}

/// Sum of open balances per student; students with nothing due report 0.
pub fn due_totals(students: &[Student], fees: &[Fee]) -> Vec<StudentDueTotal> {
    let mut sums: HashMap<Uuid, f64> = HashMap::new();
    for fee in fees.iter().filter(|f| f.status.is_outstanding()) {
        *sums.entry(fee.student_id).or_default() += fee.amount;
    }
    students
        .iter()
        .map(|s| StudentDueTotal {
            student_id: s.id,
            total_due: round_money(sums.get(&s.id).copied().unwrap_or(0.0)),
        })
        .collect()
}

pub struct FeeService;

impl FeeService {
    async fn authorized_student(
        store: &dyn SchoolStore,
        principal: &Principal,
        student_id: Uuid,
    ) -> Result<Student> {
        let student = store
            .get_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student {student_id}")))?;
        ensure_access(principal, &student.class, Some(student.section.as_str()))?;
        Ok(student)
    }

    /// One `pending` due per student, all on identical terms.
    pub async fn create_due(
        store: &dyn SchoolStore,
        principal: &Principal,
        req: &CreateDueRequest,
    ) -> Result<Vec<Fee>> {
        if req.student_ids.is_empty() {
            return Err(AppError::validation("student_ids", "Select at least one student"));
        }
        if !req.amount.is_finite() || req.amount <= 0.0 {
            return Err(AppError::validation("amount", "Amount must be greater than 0"));
        }
        if req.fee_type.trim().is_empty() {
            return Err(AppError::validation("fee_type", "Fee type is required"));
        }

        let students = store
            .list_students(&StudentFilter {
                ids: Some(req.student_ids.clone()),
                ..Default::default()
            })
            .await?;
        for id in &req.student_ids {
            let student = students
                .iter()
                .find(|s| s.id == *id)
                .ok_or_else(|| AppError::NotFound(format!("student {id}")))?;
            ensure_access(principal, &student.class, Some(student.section.as_str()))?;
        }

        let now = Utc::now();
        let amount = round_money(req.amount);
        let dues: Vec<Fee> = req
            .student_ids
            .iter()
            .map(|student_id| Fee {
                id: Uuid::new_v4(),
                student_id: *student_id,
                fee_type: req.fee_type.trim().to_string(),
                amount,
                original_amount: amount,
                due_date: req.due_date,
                academic_year: req.academic_year.clone(),
                term: req.term.clone(),
                status: FeeStatus::Pending,
                paid_date: None,
                parent_fee_id: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let created = store.insert_fees(dues).await?;
        tracing::info!(count = created.len(), fee_type = %req.fee_type, amount, "dues created");
        Ok(created)
    }

    pub async fn list_outstanding(
        store: &dyn SchoolStore,
        principal: &Principal,
        student_id: Uuid,
    ) -> Result<Vec<Fee>> {
        Self::authorized_student(store, principal, student_id).await?;
        let fees = store
            .list_fees(&FeeFilter {
                student_ids: Some(vec![student_id]),
                statuses: Some(FeeStatus::OUTSTANDING.to_vec()),
                ..Default::default()
            })
            .await?;
        Ok(fees)
    }

    /// Payment records for a student, newest first.
    pub async fn payment_history(
        store: &dyn SchoolStore,
        principal: &Principal,
        student_id: Uuid,
    ) -> Result<Vec<Fee>> {
        Self::authorized_student(store, principal, student_id).await?;
        let mut paid = store
            .list_fees(&FeeFilter {
                student_ids: Some(vec![student_id]),
                statuses: Some(vec![FeeStatus::Paid]),
                ..Default::default()
            })
            .await?;
        paid.retain(|f| f.parent_fee_id.is_some());
        paid.sort_by(|a, b| (b.paid_date, b.created_at).cmp(&(a.paid_date, a.created_at)));
        Ok(paid)
    }

    /// Records a payment against an open due and returns the new payment row.
    pub async fn record_payment(
        store: &dyn SchoolStore,
        principal: &Principal,
        fee_id: Uuid,
        payment_amount: f64,
        today: NaiveDate,
    ) -> Result<Fee> {
        let due = store
            .get_fee(fee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("fee {fee_id}")))?;
        Self::authorized_student(store, principal, due.student_id).await?;

        let outcome = apply_payment(&due, payment_amount, today)?;
        if let Some(excess) = outcome.overpaid_by {
            OVERPAYMENTS_COUNTER.inc();
            tracing::warn!(
                %fee_id,
                remaining = due.amount,
                paid = outcome.payment.amount,
                excess,
                "payment exceeds remaining balance, due closed at 0"
            );
        }

        let status = outcome.due.status;
        let payment = store
            .apply_payment(&due, outcome.due, outcome.payment)
            .await
            .map_err(|e| match e {
                StoreError::Stale(_) => {
                    tracing::warn!(%fee_id, "due changed while the payment was being recorded");
                    AppError::validation(
                        "fee_id",
                        "Fee was updated by another payment, reload and try again",
                    )
                }
                other => other.into(),
            })?;
        PAYMENTS_COUNTER.with_label_values(&[status.as_str()]).inc();
        tracing::info!(%fee_id, amount = payment.amount, %status, "payment recorded");
        Ok(payment)
    }

    pub async fn due_totals_by_class(
        store: &dyn SchoolStore,
        principal: &Principal,
        class: &str,
        section: &str,
    ) -> Result<Vec<StudentDueTotal>> {
        ensure_access(principal, class, Some(section))?;
        let students = store
            .list_students(&StudentFilter::class_section(class, section))
            .await?;
        if students.is_empty() {
            return Ok(vec![]);
        }
        let fees = store
            .list_fees(&FeeFilter {
                student_ids: Some(students.iter().map(|s| s.id).collect()),
                statuses: Some(FeeStatus::OUTSTANDING.to_vec()),
                ..Default::default()
            })
            .await?;
        Ok(due_totals(&students, &fees))
    }

    /// Collection figures over every student the principal can see.
    pub async fn collection_summary(
        store: &dyn SchoolStore,
        principal: &Principal,
    ) -> Result<CollectionStats> {
        let visible: Vec<Uuid> = store
            .list_students(&StudentFilter::default())
            .await?
            .into_iter()
            .filter(|s| can_access(principal, &s.class, Some(s.section.as_str())))
            .map(|s| s.id)
            .collect();
        if visible.is_empty() {
            return Ok(CollectionStats::default());
        }
        let fees = store
            .list_fees(&FeeFilter {
                student_ids: Some(visible),
                ..Default::default()
            })
            .await?;
        Ok(collection_stats(&fees))
    }

    /// Checks `original_amount == payments + remaining` for one due.
    pub async fn verify_ledger(
        store: &dyn SchoolStore,
        principal: &Principal,
        fee_id: Uuid,
    ) -> Result<LedgerCheck> {
        let due = store
            .get_fee(fee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("fee {fee_id}")))?;
        if due.parent_fee_id.is_some() {
            return Err(AppError::validation("fee_id", "Fee is a payment record, not a due"));
        }
        Self::authorized_student(store, principal, due.student_id).await?;

        let payments = store
            .list_fees(&FeeFilter {
                parent_fee_id: Some(due.id),
                statuses: Some(vec![FeeStatus::Paid]),
                ..Default::default()
            })
            .await?;
        let paid_total = round_money(payments.iter().map(|p| p.amount).sum());
        let remaining = if due.status.is_outstanding() { due.amount } else { 0.0 };
        let balanced = (due.original_amount - (paid_total + remaining)).abs() < 0.005;
        if !balanced {
            tracing::warn!(%fee_id, original = due.original_amount, paid_total, remaining, "ledger out of balance");
        }
        Ok(LedgerCheck {
            fee_id,
            original_amount: due.original_amount,
            paid_total,
            remaining,
            balanced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fee::CategoryStats;

    fn due(amount: f64) -> Fee {
        let now = Utc::now();
        Fee {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            fee_type: "tuition".into(),
            amount,
            original_amount: amount,
            due_date: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
            academic_year: "2025-26".into(),
            term: "Term 1".into(),
            status: FeeStatus::Pending,
            paid_date: None,
            parent_fee_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    #[test]
    fn partial_then_final_payment() {
        let original = due(1000.0);

        let first = apply_payment(&original, 400.0, today()).unwrap();
        assert_eq!(first.due.status, FeeStatus::PartiallyPaid);
        assert_eq!(first.due.amount, 600.0);
        assert_eq!(first.due.original_amount, 1000.0);
        assert_eq!(first.payment.status, FeeStatus::Paid);
        assert_eq!(first.payment.amount, 400.0);
        assert_eq!(first.payment.paid_date, Some(today()));
        assert_eq!(first.payment.parent_fee_id, Some(original.id));
        assert_eq!(first.payment.fee_type, "tuition");
        assert_eq!(first.payment.term, "Term 1");
        assert_eq!(first.payment.due_date, original.due_date);
        assert_eq!(first.overpaid_by, None);

        let second = apply_payment(&first.due, 600.0, today()).unwrap();
        assert_eq!(second.due.status, FeeStatus::Paid);
        assert_eq!(second.due.amount, 0.0);
        assert_eq!(second.due.paid_date, Some(today()));
        assert_eq!(first.payment.amount + second.payment.amount, 1000.0);
    }

    #[test]
    fn overpayment_is_clamped_and_reported() {
        let outcome = apply_payment(&due(250.0), 300.0, today()).unwrap();
        assert_eq!(outcome.due.status, FeeStatus::Paid);
        assert_eq!(outcome.due.amount, 0.0);
        assert_eq!(outcome.payment.amount, 300.0);
        assert_eq!(outcome.overpaid_by, Some(50.0));
    }

    #[test]
    fn rejects_non_positive_payments() {
        for amount in [0.0, -5.0, f64::NAN] {
            match apply_payment(&due(100.0), amount, today()) {
                Err(AppError::Validation { field, .. }) => assert_eq!(field, "amount"),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn payments_are_kept_to_the_cent() {
        match apply_payment(&due(1000.0), 0.004, today()) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "amount"),
            other => panic!("unexpected {other:?}"),
        }

        let outcome = apply_payment(&due(1000.0), 250.456, today()).unwrap();
        assert_eq!(outcome.payment.amount, 250.46);
        assert_eq!(outcome.payment.original_amount, 250.46);
        assert_eq!(outcome.due.amount, 749.54);
        assert_eq!(outcome.due.status, FeeStatus::PartiallyPaid);
    }

    #[test]
    fn rejects_payment_against_settled_row() {
        let mut settled = due(100.0);
        settled.status = FeeStatus::Paid;
        assert!(matches!(
            apply_payment(&settled, 10.0, today()),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn stats_split_collected_and_pending() {
        let mut paid = due(300.0);
        paid.status = FeeStatus::Paid;
        let mut bus_partial = due(200.0);
        bus_partial.fee_type = "transport".into();
        bus_partial.status = FeeStatus::PartiallyPaid;
        let pending = due(500.0);

        let stats = collection_stats(&[paid, bus_partial, pending]);
        assert_eq!(stats.collected, 300.0);
        assert_eq!(stats.pending, 700.0);
        assert_eq!(stats.rate, 30.0);
        assert_eq!(
            stats.by_category.get("tuition"),
            Some(&CategoryStats { collected: 300.0, pending: 500.0 })
        );
        assert_eq!(
            stats.by_category.get("transport"),
            Some(&CategoryStats { collected: 0.0, pending: 200.0 })
        );
    }

    #[test]
    fn stats_rate_is_zero_without_fees() {
        let stats = collection_stats(&[]);
        assert_eq!(stats.rate, 0.0);
        assert!(stats.by_category.is_empty());
    }
}
