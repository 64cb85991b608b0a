use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        student::{CreateStudentRequest, Student, StudentQuery, StudentStatus, UpdateStudentRequest},
        user::Principal,
    },
    services::access::{can_access, ensure_access, ensure_admin, validate_class_section},
    store::{SchoolStore, StudentFilter},
};

/// Mirrors `class` into `grade_class`. Every student write goes through here.
fn sync_grade_class(student: &mut Student) {
    student.grade_class = student.class.clone();
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(field, format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub struct StudentService;

impl StudentService {
    pub async fn list(
        store: &dyn SchoolStore,
        principal: &Principal,
        query: &StudentQuery,
    ) -> Result<Vec<Student>> {
        if let Some(class) = &query.class {
            ensure_access(principal, class, query.section.as_deref())?;
        }
        let students = store
            .list_students(&StudentFilter {
                class: query.class.clone(),
                section: query.section.clone(),
                status: query.status,
                ids: None,
            })
            .await?;
        Ok(students
            .into_iter()
            .filter(|s| can_access(principal, &s.class, Some(s.section.as_str())))
            .collect())
    }

    pub async fn get(store: &dyn SchoolStore, principal: &Principal, id: Uuid) -> Result<Student> {
        let student = store
            .get_student(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student {id}")))?;
        ensure_access(principal, &student.class, Some(student.section.as_str()))?;
        Ok(student)
    }

    async fn ensure_roll_free(
        store: &dyn SchoolStore,
        class: &str,
        section: &str,
        roll_number: &str,
        except: Option<Uuid>,
    ) -> Result<()> {
        let taken = store
            .list_students(&StudentFilter::class_section(class, section))
            .await?
            .iter()
            .any(|s| s.roll_number == roll_number && Some(s.id) != except);
        if taken {
            return Err(AppError::validation(
                "roll_number",
                format!("Roll number {roll_number} is already used in class {class}-{section}"),
            ));
        }
        Ok(())
    }

    pub async fn create(
        store: &dyn SchoolStore,
        principal: &Principal,
        req: &CreateStudentRequest,
    ) -> Result<Student> {
        ensure_admin(principal)?;
        let roll_number = required("roll_number", &req.roll_number)?;
        let first_name = required("first_name", &req.first_name)?;
        let last_name = required("last_name", &req.last_name)?;
        validate_class_section(&req.class, &req.section)?;
        Self::ensure_roll_free(store, &req.class, &req.section, &roll_number, None).await?;

        let now = Utc::now();
        let mut student = Student {
            id: Uuid::new_v4(),
            roll_number,
            first_name,
            last_name,
            class: req.class.clone(),
            section: req.section.clone(),
            grade_class: String::new(),
            status: StudentStatus::Active,
            guardian_name: req.guardian_name.clone(),
            guardian_phone: req.guardian_phone.clone(),
            guardian_email: req.guardian_email.clone(),
            date_of_birth: req.date_of_birth,
            admission_date: req.admission_date.or(Some(now.date_naive())),
            created_at: now,
            updated_at: now,
        };
        sync_grade_class(&mut student);

        let student = store.insert_student(student).await?;
        tracing::info!(student_id = %student.id, class = %student.class, section = %student.section, "student created");
        Ok(student)
    }

    pub async fn update(
        store: &dyn SchoolStore,
        principal: &Principal,
        id: Uuid,
        req: &UpdateStudentRequest,
    ) -> Result<Student> {
        ensure_admin(principal)?;
        let mut student = store
            .get_student(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student {id}")))?;

        if let Some(roll) = &req.roll_number {
            student.roll_number = required("roll_number", roll)?;
        }
        if let Some(name) = &req.first_name {
            student.first_name = required("first_name", name)?;
        }
        if let Some(name) = &req.last_name {
            student.last_name = required("last_name", name)?;
        }
        if let Some(class) = &req.class {
            student.class = class.clone();
        }
        if let Some(section) = &req.section {
            student.section = section.clone();
        }
        if let Some(status) = req.status {
            student.status = status;
        }
        if req.guardian_name.is_some() {
            student.guardian_name = req.guardian_name.clone();
        }
        if req.guardian_phone.is_some() {
            student.guardian_phone = req.guardian_phone.clone();
        }
        if req.guardian_email.is_some() {
            student.guardian_email = req.guardian_email.clone();
        }
        if req.date_of_birth.is_some() {
            student.date_of_birth = req.date_of_birth;
        }
        if req.admission_date.is_some() {
            student.admission_date = req.admission_date;
        }

        validate_class_section(&student.class, &student.section)?;
        Self::ensure_roll_free(
            store,
            &student.class,
            &student.section,
            &student.roll_number,
            Some(student.id),
        )
        .await?;
        sync_grade_class(&mut student);
        student.updated_at = Utc::now();

        Ok(store.update_student(student).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_class_follows_class() {
        let now = Utc::now();
        let mut s = Student {
            id: Uuid::new_v4(),
            roll_number: "7".into(),
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            class: "9".into(),
            section: "B".into(),
            grade_class: "8".into(),
            status: StudentStatus::Active,
            guardian_name: None,
            guardian_phone: None,
            guardian_email: None,
            date_of_birth: None,
            admission_date: None,
            created_at: now,
            updated_at: now,
        };
        sync_grade_class(&mut s);
        assert_eq!(s.grade_class, "9");
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("roll_number", " 12 ").unwrap(), "12");
        match required("roll_number", "   ") {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "roll_number"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
