#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use schoolhub_api::{
    models::{
        student::{Student, StudentStatus},
        user::{ClassAssignment, Principal, User, UserRole},
    },
    services::access::AccessPolicy,
    store::{MemoryStore, SchoolStore},
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn admin() -> Principal {
    Principal {
        user_id: Uuid::new_v4(),
        role: UserRole::Admin,
        assignments: vec![],
        policy: AccessPolicy::Legacy,
    }
}

/// A teacher holding exactly the given class-sections.
pub fn teacher(pairs: &[(&str, &str)]) -> Principal {
    let user_id = Uuid::new_v4();
    Principal {
        user_id,
        role: UserRole::Teacher,
        assignments: pairs
            .iter()
            .map(|(class, section)| ClassAssignment {
                id: Uuid::new_v4(),
                user_id,
                class: class.to_string(),
                section: section.to_string(),
                created_at: Utc::now(),
            })
            .collect(),
        policy: AccessPolicy::Legacy,
    }
}

pub async fn add_student(store: &MemoryStore, roll: &str, class: &str, section: &str) -> Student {
    let now = Utc::now();
    let student = Student {
        id: Uuid::new_v4(),
        roll_number: roll.to_string(),
        first_name: format!("Student{roll}"),
        last_name: format!("{class}{section}"),
        class: class.to_string(),
        section: section.to_string(),
        grade_class: class.to_string(),
        status: StudentStatus::Active,
        guardian_name: None,
        guardian_phone: None,
        guardian_email: None,
        date_of_birth: None,
        admission_date: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_student(student).await.expect("insert student")
}

/// Stores an active user with a cheap bcrypt hash of `password`.
pub async fn add_user(store: &MemoryStore, email: &str, password: &str, role: UserRole) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: bcrypt::hash(password, 4).expect("hash"),
        first_name: "Test".into(),
        last_name: role.to_string(),
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.insert_user(user).await.expect("insert user")
}
