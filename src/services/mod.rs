pub mod access;
pub mod attendance;
pub mod audit;
pub mod auth;
pub mod exams;
pub mod fees;
pub mod grades;
pub mod metrics;
pub mod reports;
pub mod students;

/// Rounds half away from zero to one decimal place, as reports display it.
pub fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `part / whole * 100`, one decimal, `0` when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    round_one_decimal(part / whole * 100.0)
}
