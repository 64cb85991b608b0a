//! CSV exports and the dashboard summary.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{attendance::DailyAttendance, fee::CollectionStats, user::Principal},
    services::{attendance::AttendanceService, fees::FeeService, grades::GradeService},
    store::{SchoolStore, StudentFilter},
};

#[derive(Debug, Serialize)]
struct DuesRow<'a> {
    student_id: Uuid,
    roll_number: &'a str,
    name: String,
    total_due: f64,
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    rank: usize,
    roll_number: &'a str,
    name: String,
    total: f64,
    percentage: f64,
    grade: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub attendance: DailyAttendance,
    pub fees: CollectionStats,
}

fn to_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner().map_err(|e| AppError::Export(e.into_error().into()))
}

pub struct ReportService;

impl ReportService {
    /// `student_id,roll_number,name,total_due` for every student of the
    /// class-section, in roll order.
    pub async fn class_dues_csv(
        store: &dyn SchoolStore,
        principal: &Principal,
        class: &str,
        section: &str,
    ) -> Result<Vec<u8>> {
        let totals = FeeService::due_totals_by_class(store, principal, class, section).await?;
        let students = store
            .list_students(&StudentFilter::class_section(class, section))
            .await?;
        let due: HashMap<Uuid, f64> = totals.iter().map(|t| (t.student_id, t.total_due)).collect();

        to_csv(students.iter().map(|s| DuesRow {
            student_id: s.id,
            roll_number: &s.roll_number,
            name: s.full_name(),
            total_due: due.get(&s.id).copied().unwrap_or(0.0),
        }))
    }

    /// Ranked exam results. Students without any marks are left out.
    pub async fn exam_results_csv(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
    ) -> Result<Vec<u8>> {
        let (exam, results) = GradeService::exam_results(store, principal, exam_id).await?;
        let students: HashMap<Uuid, _> = store
            .list_students(&StudentFilter::class_section(&exam.class, &exam.section))
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        to_csv(results.iter().filter_map(|r| {
            let s = students.get(&r.student_id)?;
            Some(ResultRow {
                rank: r.rank,
                roll_number: &s.roll_number,
                name: s.full_name(),
                total: r.total_marks,
                percentage: r.percentage,
                grade: r.grade.to_string(),
            })
        }))
    }

    pub async fn dashboard(
        store: &dyn SchoolStore,
        principal: &Principal,
        today: NaiveDate,
        count_late_as_present: bool,
    ) -> Result<DashboardSummary> {
        let attendance =
            AttendanceService::daily_breakdown(store, principal, today, count_late_as_present)
                .await?;
        let fees = FeeService::collection_summary(store, principal).await?;
        Ok(DashboardSummary { attendance, fees })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_from_field_names() {
        let bytes = to_csv([DuesRow {
            student_id: Uuid::nil(),
            roll_number: "4",
            name: "Ravi Kumar".into(),
            total_due: 1250.5,
        }])
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("student_id,roll_number,name,total_due"));
        assert_eq!(
            lines.next(),
            Some("00000000-0000-0000-0000-000000000000,4,Ravi Kumar,1250.5")
        );
    }
}
