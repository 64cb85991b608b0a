use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum StudentStatus {
        Active => "active",
        Inactive => "inactive",
        Graduated => "graduated",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub roll_number: String,
    pub first_name: String,
    pub last_name: String,
    pub class: String,
    pub section: String,
    /// Denormalized mirror of `class`, rewritten on every write.
    pub grade_class: String,
    pub status: StudentStatus,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub admission_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub roll_number: String,
    pub first_name: String,
    pub last_name: String,
    pub class: String,
    pub section: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub admission_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudentRequest {
    pub roll_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub status: Option<StudentStatus>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub admission_date: Option<NaiveDate>,
}

/// Query params for GET /students.
#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub class: Option<String>,
    pub section: Option<String>,
    pub status: Option<StudentStatus>,
}
