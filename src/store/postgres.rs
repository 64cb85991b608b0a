use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
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

/// Parses a TEXT enum column, reporting the table on failure.
fn parse_text<T: std::str::FromStr<Err = anyhow::Error>>(table: &'static str, raw: &str) -> Result<T> {
    raw.parse().map_err(|e: anyhow::Error| StoreError::Corrupt {
        table,
        message: e.to_string(),
    })
}

// DB row structs — enum columns are TEXT with CHECK constraints and are parsed
// into typed models after fetch.

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self> {
        Ok(User {
            role: parse_text("users", &r.role)?,
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct StudentRow {
    id: Uuid,
    roll_number: String,
    first_name: String,
    last_name: String,
    class: String,
    section: String,
    grade_class: String,
    status: String,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
    guardian_email: Option<String>,
    date_of_birth: Option<NaiveDate>,
    admission_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StudentRow> for Student {
    type Error = StoreError;

    fn try_from(r: StudentRow) -> Result<Self> {
        Ok(Student {
            status: parse_text("students", &r.status)?,
            id: r.id,
            roll_number: r.roll_number,
            first_name: r.first_name,
            last_name: r.last_name,
            class: r.class,
            section: r.section,
            grade_class: r.grade_class,
            guardian_name: r.guardian_name,
            guardian_phone: r.guardian_phone,
            guardian_email: r.guardian_email,
            date_of_birth: r.date_of_birth,
            admission_date: r.admission_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ExamRow {
    id: Uuid,
    name: String,
    class: String,
    section: String,
    academic_year: String,
    exam_date: Option<NaiveDate>,
    total_marks: Option<f64>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExamRow> for Exam {
    type Error = StoreError;

    fn try_from(r: ExamRow) -> Result<Self> {
        Ok(Exam {
            status: parse_text("exams", &r.status)?,
            id: r.id,
            name: r.name,
            class: r.class,
            section: r.section,
            academic_year: r.academic_year,
            exam_date: r.exam_date,
            total_marks: r.total_marks,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct FeeRow {
    id: Uuid,
    student_id: Uuid,
    fee_type: String,
    amount: f64,
    original_amount: f64,
    due_date: NaiveDate,
    academic_year: String,
    term: String,
    status: String,
    paid_date: Option<NaiveDate>,
    parent_fee_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FeeRow> for Fee {
    type Error = StoreError;

    fn try_from(r: FeeRow) -> Result<Self> {
        Ok(Fee {
            status: parse_text("fees", &r.status)?,
            id: r.id,
            student_id: r.student_id,
            fee_type: r.fee_type,
            amount: r.amount,
            original_amount: r.original_amount,
            due_date: r.due_date,
            academic_year: r.academic_year,
            term: r.term,
            paid_date: r.paid_date,
            parent_fee_id: r.parent_fee_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: Uuid,
    student_id: Uuid,
    date: NaiveDate,
    status: String,
    remarks: Option<String>,
    marked_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(r: AttendanceRow) -> Result<Self> {
        Ok(AttendanceRecord {
            status: parse_text("attendance", &r.status)?,
            id: r.id,
            student_id: r.student_id,
            date: r.date,
            remarks: r.remarks,
            marked_by: r.marked_by,
            updated_at: r.updated_at,
        })
    }
}

fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const STUDENT_COLUMNS: &str = "id, roll_number, first_name, last_name, class, section, grade_class, \
     status, guardian_name, guardian_phone, guardian_email, date_of_birth, admission_date, \
     created_at, updated_at";

const FEE_COLUMNS: &str = "id, student_id, fee_type, amount, original_amount, due_date, academic_year, \
     term, status, paid_date, parent_fee_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SchoolStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn list_assignments(&self, user_id: Uuid) -> Result<Vec<ClassAssignment>> {
        let rows = sqlx::query_as::<_, ClassAssignment>(
            "SELECT * FROM class_assignments WHERE user_id = $1 ORDER BY class, section",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_assignment(&self, assignment: ClassAssignment) -> Result<ClassAssignment> {
        let row = sqlx::query_as::<_, ClassAssignment>(
            "INSERT INTO class_assignments (id, user_id, class, section, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(assignment.id)
        .bind(assignment.user_id)
        .bind(&assignment.class)
        .bind(&assignment.section)
        .bind(assignment.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM class_assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {STUDENT_COLUMNS} FROM students WHERE TRUE"));
        if let Some(class) = &filter.class {
            qb.push(" AND class = ").push_bind(class);
        }
        if let Some(section) = &filter.section {
            qb.push(" AND section = ").push_bind(section);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(ids) = &filter.ids {
            qb.push(" AND id = ANY(").push_bind(ids).push(")");
        }
        qb.push(" ORDER BY class, section, roll_number");
        let rows: Vec<StudentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        convert(rows)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Student::try_from).transpose()
    }

    async fn insert_student(&self, s: Student) -> Result<Student> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "INSERT INTO students ({STUDENT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(s.id)
        .bind(&s.roll_number)
        .bind(&s.first_name)
        .bind(&s.last_name)
        .bind(&s.class)
        .bind(&s.section)
        .bind(&s.grade_class)
        .bind(s.status.as_str())
        .bind(&s.guardian_name)
        .bind(&s.guardian_phone)
        .bind(&s.guardian_email)
        .bind(s.date_of_birth)
        .bind(s.admission_date)
        .bind(s.created_at)
        .bind(s.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_student(&self, s: Student) -> Result<Student> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "UPDATE students
             SET roll_number = $2, first_name = $3, last_name = $4, class = $5, section = $6,
                 grade_class = $7, status = $8, guardian_name = $9, guardian_phone = $10,
                 guardian_email = $11, date_of_birth = $12, admission_date = $13, updated_at = $14
             WHERE id = $1
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(s.id)
        .bind(&s.roll_number)
        .bind(&s.first_name)
        .bind(&s.last_name)
        .bind(&s.class)
        .bind(&s.section)
        .bind(&s.grade_class)
        .bind(s.status.as_str())
        .bind(&s.guardian_name)
        .bind(&s.guardian_phone)
        .bind(&s.guardian_email)
        .bind(s.date_of_birth)
        .bind(s.admission_date)
        .bind(s.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::Missing(s.id))?;
        row.try_into()
    }

    async fn list_subjects(&self, class: &str, section: &str) -> Result<Vec<Subject>> {
        let rows = sqlx::query_as::<_, Subject>(
            "SELECT * FROM subjects
             WHERE class = $1 AND (section IS NULL OR section = $2)
             ORDER BY name",
        )
        .bind(class)
        .bind(section)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
        let row = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_subject(&self, subject: Subject) -> Result<Subject> {
        let row = sqlx::query_as::<_, Subject>(
            "INSERT INTO subjects (id, name, code, class, section)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(subject.id)
        .bind(&subject.name)
        .bind(&subject.code)
        .bind(&subject.class)
        .bind(&subject.section)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_exam(
        &self,
        exam: Exam,
        subjects: Vec<ExamSubject>,
    ) -> Result<(Exam, Vec<ExamSubject>)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ExamRow>(
            "INSERT INTO exams (id, name, class, section, academic_year, exam_date, total_marks, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(exam.id)
        .bind(&exam.name)
        .bind(&exam.class)
        .bind(&exam.section)
        .bind(&exam.academic_year)
        .bind(exam.exam_date)
        .bind(exam.total_marks)
        .bind(exam.status.as_str())
        .bind(exam.created_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(subjects.len());
        for s in &subjects {
            let es = sqlx::query_as::<_, ExamSubject>(
                "INSERT INTO exam_subjects (id, exam_id, subject_id, max_marks)
                 VALUES ($1, $2, $3, $4)
                 RETURNING *",
            )
            .bind(s.id)
            .bind(s.exam_id)
            .bind(s.subject_id)
            .bind(s.max_marks)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(es);
        }

        tx.commit().await?;
        Ok((row.try_into()?, stored))
    }

    async fn get_exam(&self, id: Uuid) -> Result<Option<Exam>> {
        let row = sqlx::query_as::<_, ExamRow>("SELECT * FROM exams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Exam::try_from).transpose()
    }

    async fn list_exams(&self, class: Option<&str>, section: Option<&str>) -> Result<Vec<Exam>> {
        let rows = sqlx::query_as::<_, ExamRow>(
            "SELECT * FROM exams
             WHERE ($1::TEXT IS NULL OR class = $1)
               AND ($2::TEXT IS NULL OR section = $2)
             ORDER BY created_at DESC",
        )
        .bind(class)
        .bind(section)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn update_exam(&self, exam: Exam) -> Result<Exam> {
        let row = sqlx::query_as::<_, ExamRow>(
            "UPDATE exams
             SET name = $2, exam_date = $3, total_marks = $4, status = $5
             WHERE id = $1
             RETURNING *",
        )
        .bind(exam.id)
        .bind(&exam.name)
        .bind(exam.exam_date)
        .bind(exam.total_marks)
        .bind(exam.status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::Missing(exam.id))?;
        row.try_into()
    }

    async fn list_exam_subjects(&self, exam_id: Uuid) -> Result<Vec<ExamSubject>> {
        let rows = sqlx::query_as::<_, ExamSubject>(
            "SELECT * FROM exam_subjects WHERE exam_id = $1",
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_exam_subject(&self, subject: ExamSubject) -> Result<ExamSubject> {
        let row = sqlx::query_as::<_, ExamSubject>(
            "INSERT INTO exam_subjects (id, exam_id, subject_id, max_marks)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(subject.id)
        .bind(subject.exam_id)
        .bind(subject.subject_id)
        .bind(subject.max_marks)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_grades(&self, exam_id: Uuid) -> Result<Vec<Grade>> {
        let rows = sqlx::query_as::<_, Grade>("SELECT * FROM grades WHERE exam_id = $1")
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn upsert_grades(&self, grades: Vec<Grade>) -> Result<Vec<Grade>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(grades.len());
        for g in &grades {
            let row = sqlx::query_as::<_, Grade>(
                "INSERT INTO grades (id, student_id, exam_id, exam_subject_id, marks_obtained, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (student_id, exam_subject_id) DO UPDATE SET
                     marks_obtained = EXCLUDED.marks_obtained,
                     exam_id        = EXCLUDED.exam_id,
                     updated_at     = EXCLUDED.updated_at
                 RETURNING *",
            )
            .bind(g.id)
            .bind(g.student_id)
            .bind(g.exam_id)
            .bind(g.exam_subject_id)
            .bind(&g.marks_obtained)
            .bind(g.updated_at)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn insert_fees(&self, fees: Vec<Fee>) -> Result<Vec<Fee>> {
        if fees.is_empty() {
            return Ok(vec![]);
        }
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(fees.len());
        for chunk in fees.chunks(100) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO fees ({FEE_COLUMNS}) "));
            qb.push_values(chunk, |mut b, f| {
                b.push_bind(f.id)
                    .push_bind(f.student_id)
                    .push_bind(f.fee_type.clone())
                    .push_bind(f.amount)
                    .push_bind(f.original_amount)
                    .push_bind(f.due_date)
                    .push_bind(f.academic_year.clone())
                    .push_bind(f.term.clone())
                    .push_bind(f.status.as_str())
                    .push_bind(f.paid_date)
                    .push_bind(f.parent_fee_id)
                    .push_bind(f.created_at)
                    .push_bind(f.updated_at);
            });
            qb.push(format!(" RETURNING {FEE_COLUMNS}"));
            let rows: Vec<FeeRow> = qb.build_query_as().fetch_all(&mut *tx).await?;
            stored.extend(convert::<FeeRow, Fee>(rows)?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn get_fee(&self, id: Uuid) -> Result<Option<Fee>> {
        let row = sqlx::query_as::<_, FeeRow>(&format!("SELECT {FEE_COLUMNS} FROM fees WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Fee::try_from).transpose()
    }

    async fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {FEE_COLUMNS} FROM fees WHERE TRUE"));
        if let Some(ids) = &filter.student_ids {
            qb.push(" AND student_id = ANY(").push_bind(ids).push(")");
        }
        if let Some(statuses) = &filter.statuses {
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            qb.push(" AND status = ANY(").push_bind(statuses).push(")");
        }
        if let Some(parent) = filter.parent_fee_id {
            qb.push(" AND parent_fee_id = ").push_bind(parent);
        }
        qb.push(" ORDER BY due_date, created_at");
        let rows: Vec<FeeRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        convert(rows)
    }

    async fn apply_payment(&self, prior: &Fee, due: Fee, payment: Fee) -> Result<Fee> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(f64, String)> =
            sqlx::query_as("SELECT amount, status FROM fees WHERE id = $1 FOR UPDATE")
                .bind(due.id)
                .fetch_optional(&mut *tx)
                .await?;
        match current {
            None => {
                tx.rollback().await?;
                return Err(StoreError::Missing(due.id));
            }
            Some((amount, status)) if amount != prior.amount || status != prior.status.as_str() => {
                tx.rollback().await?;
                return Err(StoreError::Stale(due.id));
            }
            Some(_) => {}
        }

        let res = sqlx::query(
            "UPDATE fees
             SET amount = $2, status = $3, paid_date = $4, updated_at = $5
             WHERE id = $1",
        )
        .bind(due.id)
        .bind(due.amount)
        .bind(due.status.as_str())
        .bind(due.paid_date)
        .bind(due.updated_at)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::Missing(due.id));
        }

        let row = sqlx::query_as::<_, FeeRow>(&format!(
            "INSERT INTO fees ({FEE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {FEE_COLUMNS}"
        ))
        .bind(payment.id)
        .bind(payment.student_id)
        .bind(&payment.fee_type)
        .bind(payment.amount)
        .bind(payment.original_amount)
        .bind(payment.due_date)
        .bind(&payment.academic_year)
        .bind(&payment.term)
        .bind(payment.status.as_str())
        .bind(payment.paid_date)
        .bind(payment.parent_fee_id)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn upsert_attendance(&self, records: Vec<AttendanceRecord>) -> Result<Vec<AttendanceRecord>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(records.len());
        for r in &records {
            let row = sqlx::query_as::<_, AttendanceRow>(
                "INSERT INTO attendance (id, student_id, date, status, remarks, marked_by, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (student_id, date) DO UPDATE SET
                     status     = EXCLUDED.status,
                     remarks    = EXCLUDED.remarks,
                     marked_by  = EXCLUDED.marked_by,
                     updated_at = NOW()
                 RETURNING *",
            )
            .bind(r.id)
            .bind(r.student_id)
            .bind(r.date)
            .bind(r.status.as_str())
            .bind(&r.remarks)
            .bind(r.marked_by)
            .bind(r.updated_at)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(AttendanceRecord::try_from(row)?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM attendance WHERE TRUE");
        if let Some(ids) = &filter.student_ids {
            qb.push(" AND student_id = ANY(").push_bind(ids).push(")");
        }
        if let Some(from) = filter.from {
            qb.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND date <= ").push_bind(to);
        }
        qb.push(" ORDER BY date");
        let rows: Vec<AttendanceRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        convert(rows)
    }

    async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO audit_log (user_id, action, resource_type, resource_id, detail)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.resource_type)
        .bind(entry.resource_id)
        .bind(entry.detail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
