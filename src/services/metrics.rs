use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login attempts by status",
        &["status"]
    ).unwrap();

    pub static ref ACCESS_DENIED_COUNTER: Counter = register_counter!(
        "api_access_denied_total",
        "Requests rejected by the class-section policy"
    ).unwrap();

    pub static ref GRADE_BATCHES_COUNTER: Counter = register_counter!(
        "school_grade_batches_saved_total",
        "Mark batches saved"
    ).unwrap();

    pub static ref PAYMENTS_COUNTER: CounterVec = register_counter_vec!(
        "school_fee_payments_total",
        "Fee payments recorded, by resulting due status",
        &["status"]
    ).unwrap();

    pub static ref OVERPAYMENTS_COUNTER: Counter = register_counter!(
        "school_fee_overpayments_total",
        "Payments that exceeded the remaining balance and were clamped"
    ).unwrap();

    pub static ref ATTENDANCE_ROWS_COUNTER: Counter = register_counter!(
        "school_attendance_rows_marked_total",
        "Attendance rows upserted"
    ).unwrap();
}

/// Registers every counter so a scrape lists them before their first event.
pub fn touch() {
    lazy_static::initialize(&LOGINS_COUNTER);
    lazy_static::initialize(&ACCESS_DENIED_COUNTER);
    lazy_static::initialize(&GRADE_BATCHES_COUNTER);
    lazy_static::initialize(&PAYMENTS_COUNTER);
    lazy_static::initialize(&OVERPAYMENTS_COUNTER);
    lazy_static::initialize(&ATTENDANCE_ROWS_COUNTER);
}
