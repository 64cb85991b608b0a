use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum FeeStatus {
        Pending => "pending",
        PartiallyPaid => "partially_paid",
        Paid => "paid",
    }
}

impl FeeStatus {
    pub const OUTSTANDING: &'static [FeeStatus] = &[FeeStatus::Pending, FeeStatus::PartiallyPaid];

    pub fn is_outstanding(&self) -> bool {
        matches!(self, FeeStatus::Pending | FeeStatus::PartiallyPaid)
    }
}

/// One ledger row. A due (`pending`/`partially_paid`) carries its remaining
/// balance in `amount`; a payment record is a `paid` row pointing back at the
/// due through `parent_fee_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fee {
    pub id: Uuid,
    pub student_id: Uuid,
    pub fee_type: String,
    pub amount: f64,
    /// Amount at creation; never rewritten.
    pub original_amount: f64,
    pub due_date: NaiveDate,
    pub academic_year: String,
    pub term: String,
    pub status: FeeStatus,
    pub paid_date: Option<NaiveDate>,
    pub parent_fee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDueRequest {
    pub student_ids: Vec<Uuid>,
    pub fee_type: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub academic_year: String,
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentDueTotal {
    pub student_id: Uuid,
    pub total_due: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryStats {
    pub collected: f64,
    pub pending: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CollectionStats {
    pub collected: f64,
    pub pending: f64,
    pub rate: f64,
    pub by_category: BTreeMap<String, CategoryStats>,
}

/// Result of checking `original_amount == payments + remaining` for one due.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LedgerCheck {
    pub fee_id: Uuid,
    pub original_amount: f64,
    pub paid_total: f64,
    pub remaining: f64,
    pub balanced: bool,
}

/// Query params for GET /fees/class-dues.
#[derive(Debug, Deserialize)]
pub struct ClassDuesQuery {
    pub class: String,
    pub section: String,
}
