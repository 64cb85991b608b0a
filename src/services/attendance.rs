use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        attendance::{
            AttendanceEntry, AttendanceRecord, DailyAttendance, RegisterRow, StatusTally,
            StudentAttendanceSummary,
        },
        student::{Student, StudentStatus},
        user::Principal,
    },
    services::{
        access::{can_access, ensure_access},
        metrics::ATTENDANCE_ROWS_COUNTER,
        percentage,
    },
    store::{AttendanceFilter, SchoolStore, StudentFilter},
};

pub fn tally<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> StatusTally {
    let mut t = StatusTally::default();
    for r in records {
        t.add(r.status);
    }
    t
}

/// Share of days attended, one decimal. Late arrivals count as attended
/// when `count_late_as_present` is set.
pub fn tally_rate(t: &StatusTally, count_late_as_present: bool) -> f64 {
    let attended = if count_late_as_present {
        t.present + t.late
    } else {
        t.present
    };
    percentage(attended as f64, t.total as f64)
}

pub fn rate(records: &[AttendanceRecord], count_late_as_present: bool) -> f64 {
    tally_rate(&tally(records), count_late_as_present)
}

/// Tallies records per class label. Records whose student is not in
/// `class_of` are skipped.
pub fn classwise_breakdown(
    records: &[AttendanceRecord],
    class_of: &HashMap<Uuid, String>,
) -> BTreeMap<String, StatusTally> {
    let mut out: BTreeMap<String, StatusTally> = BTreeMap::new();
    for r in records {
        if let Some(class) = class_of.get(&r.student_id) {
            out.entry(class.clone()).or_default().add(r.status);
        }
    }
    out
}

pub fn summarize(
    student_id: Uuid,
    records: &[AttendanceRecord],
    count_late_as_present: bool,
) -> StudentAttendanceSummary {
    let t = tally(records.iter().filter(|r| r.student_id == student_id));
    StudentAttendanceSummary {
        student_id,
        total_days: t.total,
        present_days: t.present,
        absent_days: t.absent,
        late_count: t.late,
        excused_count: t.excused,
        percentage: tally_rate(&t, count_late_as_present),
    }
}

pub struct AttendanceService;

impl AttendanceService {
    /// Upserts one row per `(student_id, date)`. A repeated pair within the
    /// batch keeps its last entry.
    pub async fn mark(
        store: &dyn SchoolStore,
        principal: &Principal,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRecord>> {
        if entries.is_empty() {
            return Err(AppError::validation("records", "Select class/section/date first"));
        }

        let ids: Vec<Uuid> = entries
            .iter()
            .map(|e| e.student_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let students = store
            .list_students(&StudentFilter {
                ids: Some(ids.clone()),
                ..Default::default()
            })
            .await?;
        let mut checked = HashSet::new();
        for id in &ids {
            let student = students
                .iter()
                .find(|s| s.id == *id)
                .ok_or_else(|| AppError::NotFound(format!("student {id}")))?;
            if checked.insert((student.class.as_str(), student.section.as_str())) {
                ensure_access(principal, &student.class, Some(student.section.as_str()))?;
            }
        }

        let now = Utc::now();
        let mut latest: HashMap<(Uuid, NaiveDate), AttendanceRecord> = HashMap::new();
        for e in entries {
            let remarks = e
                .remarks
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string);
            latest.insert(
                (e.student_id, e.date),
                AttendanceRecord {
                    id: Uuid::new_v4(),
                    student_id: e.student_id,
                    date: e.date,
                    status: e.status,
                    remarks,
                    marked_by: Some(principal.user_id),
                    updated_at: now,
                },
            );
        }
        let mut records: Vec<AttendanceRecord> = latest.into_values().collect();
        records.sort_by_key(|r| (r.date, r.student_id));

        let stored = store.upsert_attendance(records).await?;
        ATTENDANCE_ROWS_COUNTER.inc_by(stored.len() as f64);
        tracing::info!(rows = stored.len(), marked_by = %principal.user_id, "attendance marked");
        Ok(stored)
    }

    pub async fn by_student_range(
        store: &dyn SchoolStore,
        principal: &Principal,
        student_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        count_late_as_present: bool,
    ) -> Result<StudentAttendanceSummary> {
        if start > end {
            return Err(AppError::validation("start", "Start date must not be after end date"));
        }
        let student = store
            .get_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student {student_id}")))?;
        ensure_access(principal, &student.class, Some(student.section.as_str()))?;

        let records = store
            .list_attendance(&AttendanceFilter {
                student_ids: Some(vec![student_id]),
                from: Some(start),
                to: Some(end),
            })
            .await?;
        Ok(summarize(student_id, &records, count_late_as_present))
    }

    /// Active students of a class-section with whatever is recorded for `date`.
    pub async fn class_register(
        store: &dyn SchoolStore,
        principal: &Principal,
        class: &str,
        section: &str,
        date: NaiveDate,
    ) -> Result<Vec<RegisterRow>> {
        ensure_access(principal, class, Some(section))?;
        let students = store
            .list_students(&StudentFilter {
                status: Some(StudentStatus::Active),
                ..StudentFilter::class_section(class, section)
            })
            .await?;
        if students.is_empty() {
            return Ok(vec![]);
        }

        let records = store
            .list_attendance(&AttendanceFilter {
                student_ids: Some(students.iter().map(|s| s.id).collect()),
                ..AttendanceFilter::on(date)
            })
            .await?;
        let by_student: HashMap<Uuid, &AttendanceRecord> =
            records.iter().map(|r| (r.student_id, r)).collect();

        Ok(students
            .iter()
            .map(|s| {
                let record = by_student.get(&s.id);
                RegisterRow {
                    student_id: s.id,
                    roll_number: s.roll_number.clone(),
                    name: s.full_name(),
                    status: record.map(|r| r.status),
                    remarks: record.and_then(|r| r.remarks.clone()),
                }
            })
            .collect())
    }

    /// Rate and per-class tallies for one day over the students the
    /// principal can see.
    pub async fn daily_breakdown(
        store: &dyn SchoolStore,
        principal: &Principal,
        date: NaiveDate,
        count_late_as_present: bool,
    ) -> Result<DailyAttendance> {
        let visible: Vec<Student> = store
            .list_students(&StudentFilter::default())
            .await?
            .into_iter()
            .filter(|s| can_access(principal, &s.class, Some(s.section.as_str())))
            .collect();

        let records = if visible.is_empty() {
            vec![]
        } else {
            store
                .list_attendance(&AttendanceFilter {
                    student_ids: Some(visible.iter().map(|s| s.id).collect()),
                    ..AttendanceFilter::on(date)
                })
                .await?
        };

        let class_of: HashMap<Uuid, String> =
            visible.into_iter().map(|s| (s.id, s.class)).collect();
        let overall = tally(&records);
        Ok(DailyAttendance {
            date,
            rate: tally_rate(&overall, count_late_as_present),
            overall,
            by_class: classwise_breakdown(&records, &class_of),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::AttendanceStatus;

    fn record(student_id: Uuid, day: u32, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            student_id,
            date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            status,
            remarks: None,
            marked_by: None,
            updated_at: Utc::now(),
        }
    }

    fn ten_days(student_id: Uuid) -> Vec<AttendanceRecord> {
        use AttendanceStatus::*;
        [Present, Present, Present, Present, Present, Present, Late, Late, Absent, Excused]
            .into_iter()
            .enumerate()
            .map(|(i, s)| record(student_id, i as u32 + 1, s))
            .collect()
    }

    #[test]
    fn late_counts_as_present_only_when_asked() {
        let records = ten_days(Uuid::new_v4());
        assert_eq!(rate(&records, true), 80.0);
        assert_eq!(rate(&records, false), 60.0);
    }

    #[test]
    fn empty_rate_is_zero() {
        assert_eq!(rate(&[], true), 0.0);
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let id = Uuid::new_v4();
        let records = vec![
            record(id, 1, AttendanceStatus::Present),
            record(id, 2, AttendanceStatus::Absent),
            record(id, 3, AttendanceStatus::Absent),
        ];
        assert_eq!(rate(&records, true), 33.3);
    }

    #[test]
    fn summary_counts_each_bucket() {
        let id = Uuid::new_v4();
        let mut records = ten_days(id);
        records.push(record(Uuid::new_v4(), 1, AttendanceStatus::Absent));

        let summary = summarize(id, &records, true);
        assert_eq!(summary.total_days, 10);
        assert_eq!(summary.present_days, 6);
        assert_eq!(summary.late_count, 2);
        assert_eq!(summary.absent_days, 1);
        assert_eq!(summary.excused_count, 1);
        assert_eq!(summary.percentage, 80.0);
    }

    #[test]
    fn breakdown_groups_by_class_label() {
        let (a, b, stranger) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let class_of = HashMap::from([(a, "5".to_string()), (b, "10".to_string())]);
        let records = vec![
            record(a, 1, AttendanceStatus::Present),
            record(b, 1, AttendanceStatus::Late),
            record(stranger, 1, AttendanceStatus::Absent),
        ];

        let breakdown = classwise_breakdown(&records, &class_of);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown["5"], StatusTally { present: 1, total: 1, ..Default::default() });
        assert_eq!(breakdown["10"], StatusTally { late: 1, total: 1, ..Default::default() });
    }
}
