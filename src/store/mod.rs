//! Record store seam. Services talk to a `SchoolStore`; the Postgres engine
//! backs the API, the memory engine backs tests and local runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    models::{
        attendance::AttendanceRecord,
        exam::{Exam, ExamSubject, Grade, Subject},
        fee::{Fee, FeeStatus},
        student::{Student, StudentStatus},
        user::{ClassAssignment, User},
    },
    services::audit::AuditEntry,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    #[error("row {0} does not exist")]
    Missing(Uuid),

    #[error("row {0} changed since it was read")]
    Stale(Uuid),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Equality/IN filters over students. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub class: Option<String>,
    pub section: Option<String>,
    pub status: Option<StudentStatus>,
    pub ids: Option<Vec<Uuid>>,
}

impl StudentFilter {
    pub fn class_section(class: &str, section: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            section: Some(section.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, s: &Student) -> bool {
        self.class.as_ref().is_none_or(|c| &s.class == c)
            && self.section.as_ref().is_none_or(|v| &s.section == v)
            && self.status.is_none_or(|v| s.status == v)
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&s.id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeeFilter {
    pub student_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<FeeStatus>>,
    pub parent_fee_id: Option<Uuid>,
}

impl FeeFilter {
    pub fn matches(&self, f: &Fee) -> bool {
        self.student_ids.as_ref().is_none_or(|ids| ids.contains(&f.student_id))
            && self.statuses.as_ref().is_none_or(|st| st.contains(&f.status))
            && self.parent_fee_id.is_none_or(|p| f.parent_fee_id == Some(p))
    }
}

/// Student IN-list plus an inclusive date range.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub student_ids: Option<Vec<Uuid>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
            ..Default::default()
        }
    }

    pub fn matches(&self, r: &AttendanceRecord) -> bool {
        self.student_ids.as_ref().is_none_or(|ids| ids.contains(&r.student_id))
            && self.from.is_none_or(|d| r.date >= d)
            && self.to.is_none_or(|d| r.date <= d)
    }
}

#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // Users & class assignments
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn insert_user(&self, user: User) -> Result<User>;
    async fn list_assignments(&self, user_id: Uuid) -> Result<Vec<ClassAssignment>>;
    async fn insert_assignment(&self, assignment: ClassAssignment) -> Result<ClassAssignment>;
    /// Returns false when nothing was deleted.
    async fn delete_assignment(&self, id: Uuid) -> Result<bool>;

    // Students
    /// Ordered by class, section, roll number.
    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>>;
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>>;
    async fn insert_student(&self, student: Student) -> Result<Student>;
    async fn update_student(&self, student: Student) -> Result<Student>;

    // Subjects, exams & grades
    /// Subjects for `class` whose section is unset or equal to `section`.
    async fn list_subjects(&self, class: &str, section: &str) -> Result<Vec<Subject>>;
    async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>>;
    async fn insert_subject(&self, subject: Subject) -> Result<Subject>;
    /// Writes the exam and its exam-subjects as one unit.
    async fn insert_exam(&self, exam: Exam, subjects: Vec<ExamSubject>) -> Result<(Exam, Vec<ExamSubject>)>;
    async fn get_exam(&self, id: Uuid) -> Result<Option<Exam>>;
    async fn list_exams(&self, class: Option<&str>, section: Option<&str>) -> Result<Vec<Exam>>;
    async fn update_exam(&self, exam: Exam) -> Result<Exam>;
    async fn list_exam_subjects(&self, exam_id: Uuid) -> Result<Vec<ExamSubject>>;
    async fn insert_exam_subject(&self, subject: ExamSubject) -> Result<ExamSubject>;
    async fn list_grades(&self, exam_id: Uuid) -> Result<Vec<Grade>>;
    /// Upserts on `(student_id, exam_subject_id)`, all rows or none.
    async fn upsert_grades(&self, grades: Vec<Grade>) -> Result<Vec<Grade>>;

    // Fees
    async fn insert_fees(&self, fees: Vec<Fee>) -> Result<Vec<Fee>>;
    async fn get_fee(&self, id: Uuid) -> Result<Option<Fee>>;
    /// Ordered by due date, then creation time.
    async fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>>;
    /// Rewrites the due and inserts the payment record in one transaction.
    /// Fails with [`StoreError::Stale`] unless the stored due still has the
    /// `amount` and `status` of `prior`.
    async fn apply_payment(&self, prior: &Fee, due: Fee, payment: Fee) -> Result<Fee>;

    // Attendance
    /// Upserts on `(student_id, date)`, all rows or none.
    async fn upsert_attendance(&self, records: Vec<AttendanceRecord>) -> Result<Vec<AttendanceRecord>>;
    /// Ordered by date.
    async fn list_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>>;

    async fn append_audit(&self, entry: AuditEntry) -> Result<()>;
}
