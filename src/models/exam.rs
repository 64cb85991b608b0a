use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum ExamStatus {
        Scheduled => "scheduled",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// Absence sentinel stored in `Grade::marks_obtained`.
pub const ABSENT_MARK: &str = "AB";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exam {
    pub id: Uuid,
    pub name: String,
    pub class: String,
    pub section: String,
    pub academic_year: String,
    pub exam_date: Option<NaiveDate>,
    pub total_marks: Option<f64>,
    pub status: ExamStatus,
    pub created_at: DateTime<Utc>,
}

/// A subject offered to a class, optionally narrowed to one section.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub class: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ExamSubject {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub subject_id: Uuid,
    pub max_marks: f64,
}

/// Marks are TEXT so the absence sentinel can sit next to numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub exam_id: Uuid,
    pub exam_subject_id: Option<Uuid>,
    pub marks_obtained: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSubjectSpec {
    pub subject_id: Uuid,
    pub max_marks: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateExamRequest {
    pub name: String,
    pub class: String,
    pub section: String,
    pub academic_year: String,
    pub exam_date: Option<NaiveDate>,
    pub total_marks: Option<f64>,
    /// Falls back to the subjects configured for the class-section.
    pub subjects: Option<Vec<ExamSubjectSpec>>,
}

#[derive(Debug, Serialize)]
pub struct ExamWithSubjects {
    #[serde(flatten)]
    pub exam: Exam,
    pub subjects: Vec<ExamSubject>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExamStatusRequest {
    pub status: ExamStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub code: String,
    pub class: Option<String>,
    pub section: Option<String>,
}

/// Query params for GET /exams and GET /subjects.
#[derive(Debug, Default, Deserialize)]
pub struct ClassSectionQuery {
    pub class: Option<String>,
    pub section: Option<String>,
}

/// One cell of the marks grid.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkEntry {
    pub student_id: Uuid,
    pub exam_subject_id: Uuid,
    pub marks_obtained: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveMarksRequest {
    pub entries: Vec<MarkEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentExamResult {
    pub student_id: Uuid,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: LetterGrade,
    pub rank: usize,
}
