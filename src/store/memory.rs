use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AttendanceFilter, FeeFilter, Result, SchoolStore, StoreError, StudentFilter};
use crate::{
    models::{
        attendance::AttendanceRecord,
        exam::{Exam, ExamSubject, Grade, Subject},
        fee::Fee,
        student::Student,
        user::{ClassAssignment, User},
    },
    services::audit::AuditEntry,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    assignments: Vec<ClassAssignment>,
    students: HashMap<Uuid, Student>,
    subjects: Vec<Subject>,
    exams: HashMap<Uuid, Exam>,
    exam_subjects: Vec<ExamSubject>,
    grades: Vec<Grade>,
    fees: Vec<Fee>,
    attendance: Vec<AttendanceRecord>,
    audit: Vec<AuditEntry>,
}

/// Process-local store. Each operation takes the table lock once, so batch
/// writes are all-or-nothing like the Postgres transactions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Arc<RwLock<Tables>>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit entries appended so far, oldest first.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.0.read().audit.clone()
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let data = self.0.read();
        Ok(data
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.0.read().users.get(&id).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        self.0.write().users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_assignments(&self, user_id: Uuid) -> Result<Vec<ClassAssignment>> {
        let data = self.0.read();
        Ok(data
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_assignment(&self, assignment: ClassAssignment) -> Result<ClassAssignment> {
        self.0.write().assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool> {
        let mut data = self.0.write();
        let before = data.assignments.len();
        data.assignments.retain(|a| a.id != id);
        Ok(data.assignments.len() != before)
    }

    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = self
            .0
            .read()
            .students
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        students.sort_by(|a, b| {
            (&a.class, &a.section, &a.roll_number).cmp(&(&b.class, &b.section, &b.roll_number))
        });
        Ok(students)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.0.read().students.get(&id).cloned())
    }

    async fn insert_student(&self, student: Student) -> Result<Student> {
        self.0.write().students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update_student(&self, student: Student) -> Result<Student> {
        let mut data = self.0.write();
        let slot = data
            .students
            .get_mut(&student.id)
            .ok_or(StoreError::Missing(student.id))?;
        *slot = student.clone();
        Ok(student)
    }

    async fn list_subjects(&self, class: &str, section: &str) -> Result<Vec<Subject>> {
        let data = self.0.read();
        let mut subjects: Vec<Subject> = data
            .subjects
            .iter()
            .filter(|s| s.class.as_deref() == Some(class))
            .filter(|s| s.section.as_deref().is_none_or(|v| v == section))
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
        Ok(self.0.read().subjects.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_subject(&self, subject: Subject) -> Result<Subject> {
        self.0.write().subjects.push(subject.clone());
        Ok(subject)
    }

    async fn insert_exam(
        &self,
        exam: Exam,
        subjects: Vec<ExamSubject>,
    ) -> Result<(Exam, Vec<ExamSubject>)> {
        let mut data = self.0.write();
        data.exams.insert(exam.id, exam.clone());
        data.exam_subjects.extend(subjects.iter().cloned());
        Ok((exam, subjects))
    }

    async fn get_exam(&self, id: Uuid) -> Result<Option<Exam>> {
        Ok(self.0.read().exams.get(&id).cloned())
    }

    async fn list_exams(&self, class: Option<&str>, section: Option<&str>) -> Result<Vec<Exam>> {
        let mut exams: Vec<Exam> = self
            .0
            .read()
            .exams
            .values()
            .filter(|e| class.is_none_or(|c| e.class == c))
            .filter(|e| section.is_none_or(|s| e.section == s))
            .cloned()
            .collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(exams)
    }

    async fn update_exam(&self, exam: Exam) -> Result<Exam> {
        let mut data = self.0.write();
        let slot = data.exams.get_mut(&exam.id).ok_or(StoreError::Missing(exam.id))?;
        *slot = exam.clone();
        Ok(exam)
    }

    async fn list_exam_subjects(&self, exam_id: Uuid) -> Result<Vec<ExamSubject>> {
        let data = self.0.read();
        Ok(data
            .exam_subjects
            .iter()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn insert_exam_subject(&self, subject: ExamSubject) -> Result<ExamSubject> {
        self.0.write().exam_subjects.push(subject.clone());
        Ok(subject)
    }

    async fn list_grades(&self, exam_id: Uuid) -> Result<Vec<Grade>> {
        let data = self.0.read();
        Ok(data
            .grades
            .iter()
            .filter(|g| g.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn upsert_grades(&self, grades: Vec<Grade>) -> Result<Vec<Grade>> {
        let mut data = self.0.write();
        let mut stored = Vec::with_capacity(grades.len());
        for grade in grades {
            let existing = data.grades.iter_mut().find(|g| {
                g.student_id == grade.student_id && g.exam_subject_id == grade.exam_subject_id
            });
            match existing {
                Some(row) => {
                    row.marks_obtained = grade.marks_obtained;
                    row.exam_id = grade.exam_id;
                    row.updated_at = grade.updated_at;
                    stored.push(row.clone());
                }
                None => {
                    data.grades.push(grade.clone());
                    stored.push(grade);
                }
            }
        }
        Ok(stored)
    }

    async fn insert_fees(&self, fees: Vec<Fee>) -> Result<Vec<Fee>> {
        self.0.write().fees.extend(fees.iter().cloned());
        Ok(fees)
    }

    async fn get_fee(&self, id: Uuid) -> Result<Option<Fee>> {
        Ok(self.0.read().fees.iter().find(|f| f.id == id).cloned())
    }

    async fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>> {
        let mut fees: Vec<Fee> = self
            .0
            .read()
            .fees
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        fees.sort_by(|a, b| (a.due_date, a.created_at).cmp(&(b.due_date, b.created_at)));
        Ok(fees)
    }

    async fn apply_payment(&self, prior: &Fee, due: Fee, payment: Fee) -> Result<Fee> {
        let mut data = self.0.write();
        let slot = data
            .fees
            .iter_mut()
            .find(|f| f.id == due.id)
            .ok_or(StoreError::Missing(due.id))?;
        if slot.amount != prior.amount || slot.status != prior.status {
            return Err(StoreError::Stale(due.id));
        }
        *slot = due;
        data.fees.push(payment.clone());
        Ok(payment)
    }

    async fn upsert_attendance(&self, records: Vec<AttendanceRecord>) -> Result<Vec<AttendanceRecord>> {
        let mut data = self.0.write();
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let existing = data
                .attendance
                .iter_mut()
                .find(|r| r.student_id == record.student_id && r.date == record.date);
            match existing {
                Some(row) => {
                    row.status = record.status;
                    row.remarks = record.remarks;
                    row.marked_by = record.marked_by;
                    row.updated_at = Utc::now();
                    stored.push(row.clone());
                }
                None => {
                    data.attendance.push(record.clone());
                    stored.push(record);
                }
            }
        }
        Ok(stored)
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>> {
        let mut records: Vec<AttendanceRecord> = self
            .0
            .read()
            .attendance
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        self.0.write().audit.push(entry);
        Ok(())
    }
}
