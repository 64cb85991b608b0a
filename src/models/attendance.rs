use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum AttendanceStatus {
        Present => "present",
        Absent => "absent",
        Late => "late",
        Excused => "excused",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub marked_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the marking form. Unknown status strings fail deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub records: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusTally {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub excused: u32,
    pub total: u32,
}

impl StatusTally {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Excused => self.excused += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentAttendanceSummary {
    pub student_id: Uuid,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub late_count: u32,
    pub excused_count: u32,
    pub percentage: f64,
}

/// A student on the marking screen with the status recorded for the day, if any.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRow {
    pub student_id: Uuid,
    pub roll_number: String,
    pub name: String,
    pub status: Option<AttendanceStatus>,
    pub remarks: Option<String>,
}

/// Query params for GET /attendance/register.
#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub class: String,
    pub section: String,
    pub date: NaiveDate,
}

/// Query params for GET /students/{id}/attendance.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub count_late_as_present: Option<bool>,
}

/// One day's figures across the visible students.
#[derive(Debug, Clone, Serialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub rate: f64,
    pub overall: StatusTally,
    pub by_class: BTreeMap<String, StatusTally>,
}
