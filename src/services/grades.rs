use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        exam::{Exam, ExamSubject, Grade, LetterGrade, MarkEntry, StudentExamResult, ABSENT_MARK},
        user::Principal,
    },
    services::{access::ensure_access, metrics::GRADE_BATCHES_COUNTER, percentage},
    store::{SchoolStore, StudentFilter},
};

/// Highest mark a single cell may hold.
pub const MARK_CEILING: f64 = 100.0;

/// Plain decimal notation only: optional minus, digits, optional fraction.
fn is_decimal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match frac {
        Some(f) => all_digits(whole) && !f.is_empty() && all_digits(f),
        None => !whole.is_empty() && all_digits(whole),
    }
}

/// A cell is valid when blank, the absence marker, or a number in `0..=100`.
pub fn validate_mark(raw: &str) -> bool {
    if raw.is_empty() || raw == ABSENT_MARK {
        return true;
    }
    if !is_decimal(raw) {
        return false;
    }
    raw.parse::<f64>()
        .map(|n| (0.0..=MARK_CEILING).contains(&n))
        .unwrap_or(false)
}

/// Rewrites the `a`/`A` shorthand to the absence marker; everything else passes through.
pub fn normalize_entry(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("a") {
        ABSENT_MARK.to_string()
    } else {
        raw.to_string()
    }
}

/// Numeric value of a stored mark. Absent and other non-numeric marks count 0.
pub fn mark_value(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

pub fn letter_grade(percentage: f64) -> LetterGrade {
    match percentage {
        p if p >= 90.0 => LetterGrade::APlus,
        p if p >= 80.0 => LetterGrade::A,
        p if p >= 70.0 => LetterGrade::BPlus,
        p if p >= 60.0 => LetterGrade::B,
        p if p >= 50.0 => LetterGrade::C,
        p if p >= 40.0 => LetterGrade::D,
        _ => LetterGrade::F,
    }
}

/// Per-student totals for one exam, best first. Only grades attached to one
/// of `exam_subjects` count. Equal percentages share a rank.
pub fn aggregate_for_exam(
    exam: &Exam,
    exam_subjects: &[ExamSubject],
    grades: &[Grade],
) -> Vec<StudentExamResult> {
    let subject_ids: HashSet<Uuid> = exam_subjects.iter().map(|s| s.id).collect();

    let mut totals: BTreeMap<Uuid, f64> = BTreeMap::new();
    for grade in grades {
        let Some(es_id) = grade.exam_subject_id else { continue };
        if !subject_ids.contains(&es_id) {
            continue;
        }
        *totals.entry(grade.student_id).or_default() += mark_value(&grade.marks_obtained);
    }

    let exam_total = exam.total_marks.unwrap_or(0.0);
    let mut results: Vec<StudentExamResult> = totals
        .into_iter()
        .map(|(student_id, total)| {
            let pct = percentage(total, exam_total);
            StudentExamResult {
                student_id,
                total_marks: total,
                percentage: pct,
                grade: letter_grade(pct),
                rank: 0,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    for i in 0..results.len() {
        results[i].rank = if i > 0 && results[i].percentage == results[i - 1].percentage {
            results[i - 1].rank
        } else {
            i + 1
        };
    }
    results
}

pub struct GradeService;

impl GradeService {
    /// Validates and upserts one marks grid for an exam. The first bad cell
    /// rejects the whole batch; blank cells are skipped.
    pub async fn save_marks(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
        entries: &[MarkEntry],
    ) -> Result<Vec<Grade>> {
        let exam = store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("exam {exam_id}")))?;
        ensure_access(principal, &exam.class, Some(exam.section.as_str()))?;

        let exam_subject_ids: HashSet<Uuid> = store
            .list_exam_subjects(exam_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let roster: HashSet<Uuid> = store
            .list_students(&StudentFilter::class_section(&exam.class, &exam.section))
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let now = Utc::now();
        let mut grades = Vec::new();
        for entry in entries {
            let cell = format!("marks[{}][{}]", entry.student_id, entry.exam_subject_id);
            let marks = normalize_entry(&entry.marks_obtained);
            if !validate_mark(&marks) {
                return Err(AppError::validation(
                    cell,
                    format!(
                        "Invalid mark '{}': enter a number between 0 and 100 or AB",
                        entry.marks_obtained
                    ),
                ));
            }
            if !exam_subject_ids.contains(&entry.exam_subject_id) {
                return Err(AppError::validation(cell, "Subject is not part of this exam"));
            }
            if !roster.contains(&entry.student_id) {
                return Err(AppError::validation(
                    cell,
                    format!("Student is not enrolled in class {} section {}", exam.class, exam.section),
                ));
            }
            if marks.is_empty() {
                continue;
            }
            grades.push(Grade {
                id: Uuid::new_v4(),
                student_id: entry.student_id,
                exam_id,
                exam_subject_id: Some(entry.exam_subject_id),
                marks_obtained: marks,
                updated_at: now,
            });
        }

        if grades.is_empty() {
            return Err(AppError::validation("entries", "Nothing to save"));
        }
        // A cell entered twice keeps its last value.
        let mut seen = HashSet::new();
        grades.reverse();
        grades.retain(|g| seen.insert((g.student_id, g.exam_subject_id)));
        grades.reverse();

        let saved = store.upsert_grades(grades).await?;
        GRADE_BATCHES_COUNTER.inc();
        tracing::info!(%exam_id, rows = saved.len(), "marks saved");
        Ok(saved)
    }

    pub async fn list_marks(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
    ) -> Result<Vec<Grade>> {
        let exam = store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("exam {exam_id}")))?;
        ensure_access(principal, &exam.class, Some(exam.section.as_str()))?;
        Ok(store.list_grades(exam_id).await?)
    }

    pub async fn exam_results(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
    ) -> Result<(Exam, Vec<StudentExamResult>)> {
        let exam = store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("exam {exam_id}")))?;
        ensure_access(principal, &exam.class, Some(exam.section.as_str()))?;

        let subjects = store.list_exam_subjects(exam_id).await?;
        let grades = store.list_grades(exam_id).await?;
        let results = aggregate_for_exam(&exam, &subjects, &grades);
        Ok((exam, results))
    }

    /// Marks keyed by student, then exam-subject, for the grid screen.
    pub fn grid(grades: &[Grade]) -> HashMap<Uuid, HashMap<Uuid, String>> {
        let mut grid: HashMap<Uuid, HashMap<Uuid, String>> = HashMap::new();
        for g in grades {
            if let Some(es) = g.exam_subject_id {
                grid.entry(g.student_id)
                    .or_default()
                    .insert(es, g.marks_obtained.clone());
            }
        }
        grid
    }
}
