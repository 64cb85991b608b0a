use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        exam::{
            CreateExamRequest, CreateSubjectRequest, Exam, ExamStatus, ExamSubject, ExamSubjectSpec,
            ExamWithSubjects, Subject,
        },
        user::Principal,
    },
    services::access::{can_access, ensure_access, ensure_admin, validate_class_section},
    store::SchoolStore,
};

/// Ceiling given to subjects pulled from the class configuration.
pub const DEFAULT_MAX_MARKS: f64 = 100.0;

fn ensure_positive_max(max_marks: f64) -> Result<()> {
    if !(max_marks.is_finite() && max_marks > 0.0) {
        return Err(AppError::validation("max_marks", "Maximum marks must be greater than 0"));
    }
    Ok(())
}

/// A subject without a class is offered to every class; one without a
/// section to every section of its class.
fn offered_to(subject: &Subject, class: &str, section: &str) -> bool {
    subject.class.as_deref().is_none_or(|c| c == class)
        && subject.section.as_deref().is_none_or(|s| s == section)
}

async fn ensure_subject_offered(
    store: &dyn SchoolStore,
    subject_id: Uuid,
    class: &str,
    section: &str,
) -> Result<()> {
    let subject = store
        .get_subject(subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("subject {subject_id}")))?;
    if !offered_to(&subject, class, section) {
        return Err(AppError::validation(
            "subject_id",
            format!("{} is not taught in class {class}-{section}", subject.name),
        ));
    }
    Ok(())
}

pub struct ExamService;

impl ExamService {
    pub async fn create_subject(
        store: &dyn SchoolStore,
        principal: &Principal,
        req: &CreateSubjectRequest,
    ) -> Result<Subject> {
        ensure_admin(principal)?;
        if req.name.trim().is_empty() {
            return Err(AppError::validation("name", "Subject name is required"));
        }
        let subject = Subject {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            code: req.code.trim().to_string(),
            class: req.class.clone(),
            section: req.section.clone(),
        };
        Ok(store.insert_subject(subject).await?)
    }

    pub async fn list_subjects(
        store: &dyn SchoolStore,
        principal: &Principal,
        class: &str,
        section: &str,
    ) -> Result<Vec<Subject>> {
        ensure_access(principal, class, Some(section))?;
        Ok(store.list_subjects(class, section).await?)
    }

    /// Creates an exam together with its exam-subjects. Without an explicit
    /// subject list, every subject configured for the class-section is
    /// examined out of [`DEFAULT_MAX_MARKS`].
    pub async fn create(
        store: &dyn SchoolStore,
        principal: &Principal,
        req: &CreateExamRequest,
    ) -> Result<ExamWithSubjects> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("name", "Exam name is required"));
        }
        if req.academic_year.trim().is_empty() {
            return Err(AppError::validation("academic_year", "Academic year is required"));
        }
        validate_class_section(&req.class, &req.section)?;
        ensure_access(principal, &req.class, Some(req.section.as_str()))?;
        if let Some(total) = req.total_marks {
            ensure_positive_max(total).map_err(|_| {
                AppError::validation("total_marks", "Total marks must be greater than 0")
            })?;
        }

        let specs: Vec<ExamSubjectSpec> = match &req.subjects {
            Some(specs) => {
                for spec in specs {
                    ensure_subject_offered(store, spec.subject_id, &req.class, &req.section)
                        .await?;
                }
                specs.clone()
            }
            None => store
                .list_subjects(&req.class, &req.section)
                .await?
                .into_iter()
                .map(|s| ExamSubjectSpec {
                    subject_id: s.id,
                    max_marks: DEFAULT_MAX_MARKS,
                })
                .collect(),
        };
        for spec in &specs {
            ensure_positive_max(spec.max_marks)?;
        }

        let exam_id = Uuid::new_v4();
        let subjects: Vec<ExamSubject> = specs
            .iter()
            .map(|spec| ExamSubject {
                id: Uuid::new_v4(),
                exam_id,
                subject_id: spec.subject_id,
                max_marks: spec.max_marks,
            })
            .collect();

        let derived_total: f64 = subjects.iter().map(|s| s.max_marks).sum();
        let total_marks = req
            .total_marks
            .or((derived_total > 0.0).then_some(derived_total));

        let exam = Exam {
            id: exam_id,
            name: req.name.trim().to_string(),
            class: req.class.clone(),
            section: req.section.clone(),
            academic_year: req.academic_year.clone(),
            exam_date: req.exam_date,
            total_marks,
            status: ExamStatus::Scheduled,
            created_at: Utc::now(),
        };

        let (exam, subjects) = store.insert_exam(exam, subjects).await?;
        tracing::info!(exam_id = %exam.id, subjects = subjects.len(), "exam created");
        Ok(ExamWithSubjects { exam, subjects })
    }

    /// Exams in the class-sections the principal may see.
    pub async fn list(
        store: &dyn SchoolStore,
        principal: &Principal,
        class: Option<&str>,
        section: Option<&str>,
    ) -> Result<Vec<Exam>> {
        if let Some(class) = class {
            ensure_access(principal, class, section)?;
        }
        let exams = store.list_exams(class, section).await?;
        Ok(exams
            .into_iter()
            .filter(|e| can_access(principal, &e.class, Some(e.section.as_str())))
            .collect())
    }

    pub async fn get(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
    ) -> Result<ExamWithSubjects> {
        let exam = store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("exam {exam_id}")))?;
        ensure_access(principal, &exam.class, Some(exam.section.as_str()))?;
        let subjects = store.list_exam_subjects(exam_id).await?;
        Ok(ExamWithSubjects { exam, subjects })
    }

    /// Adds one subject to an exam. A total derived from the exam-subjects
    /// (absent, or equal to their sum) grows with the new `max_marks`; an
    /// explicitly set total is left alone.
    pub async fn add_subject(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
        spec: &ExamSubjectSpec,
    ) -> Result<ExamSubject> {
        let mut exam = store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("exam {exam_id}")))?;
        ensure_access(principal, &exam.class, Some(exam.section.as_str()))?;
        ensure_positive_max(spec.max_marks)?;

        ensure_subject_offered(store, spec.subject_id, &exam.class, &exam.section).await?;

        let existing = store.list_exam_subjects(exam_id).await?;
        if existing.iter().any(|s| s.subject_id == spec.subject_id) {
            return Err(AppError::validation("subject_id", "Subject is already part of this exam"));
        }
        let existing_total: f64 = existing.iter().map(|s| s.max_marks).sum();
        let derived = exam
            .total_marks
            .is_none_or(|t| (t - existing_total).abs() < 0.005);

        let subject = ExamSubject {
            id: Uuid::new_v4(),
            exam_id,
            subject_id: spec.subject_id,
            max_marks: spec.max_marks,
        };
        let subject = store.insert_exam_subject(subject).await?;

        if derived {
            let total = existing_total + subject.max_marks;
            exam.total_marks = Some(total);
            store.update_exam(exam).await?;
            tracing::info!(%exam_id, total, "exam total recomputed");
        }
        Ok(subject)
    }

    pub async fn update_status(
        store: &dyn SchoolStore,
        principal: &Principal,
        exam_id: Uuid,
        status: ExamStatus,
    ) -> Result<Exam> {
        let mut exam = store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("exam {exam_id}")))?;
        ensure_access(principal, &exam.class, Some(exam.section.as_str()))?;
        exam.status = status;
        Ok(store.update_exam(exam).await?)
    }
}
