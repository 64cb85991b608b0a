//! Demo data seed script
//!
//! Seeds the database with a small school:
//! - 3 users: 1 admin, 1 class teacher (class 8 section A), 1 accounts staff
//! - 12 students in class 8 section A
//! - 4 subjects and a term exam with marks for every student
//! - tuition and transport dues, some partly or fully paid
//! - attendance for the last 10 school days
//!
//! Usage:
//!   DATABASE_URL=... DEMO_PASSWORD=Demo2025! ./seed-demo [--reset] [--seed 7]

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use uuid::Uuid;

use schoolhub_api::{
    db,
    models::{
        attendance::{AttendanceEntry, AttendanceStatus},
        exam::{CreateExamRequest, CreateSubjectRequest, MarkEntry},
        fee::{CreateDueRequest, FeeStatus},
        student::CreateStudentRequest,
        user::{CreateAssignmentRequest, Principal, User, UserRole},
    },
    services::{
        access::{AccessPolicy, AccessService},
        attendance::AttendanceService,
        auth::AuthService,
        exams::ExamService,
        fees::FeeService,
        grades::GradeService,
        students::StudentService,
    },
    store::{FeeFilter, PgStore, SchoolStore},
};

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed a demo school into the schoolhub database")]
struct Args {
    /// Truncate every school table before seeding
    #[arg(long)]
    reset: bool,

    /// RNG seed for marks, payments and attendance
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

const CLASS: &str = "8";
const SECTION: &str = "A";
const ACADEMIC_YEAR: &str = "2025-26";

const STUDENTS: &[(&str, &str)] = &[
    ("Aarav", "Sharma"),
    ("Diya", "Patel"),
    ("Kabir", "Singh"),
    ("Meera", "Iyer"),
    ("Rohan", "Gupta"),
    ("Ananya", "Reddy"),
    ("Vihaan", "Nair"),
    ("Saanvi", "Joshi"),
    ("Arjun", "Menon"),
    ("Ishita", "Das"),
    ("Kiran", "Rao"),
    ("Tara", "Bose"),
];

const SUBJECTS: &[(&str, &str)] = &[
    ("Mathematics", "MATH"),
    ("Science", "SCI"),
    ("English", "ENG"),
    ("Social Studies", "SST"),
];

fn user(email: &str, first: &str, last: &str, role: UserRole, password_hash: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// The last `n` weekdays up to and including `today`, oldest first.
fn school_days(today: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut d = today;
    while days.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(d);
        }
        d -= Duration::days(1);
    }
    days.reverse();
    days
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let demo_password = std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "Demo2025!".to_string());
    let mut rng = StdRng::seed_from_u64(args.seed);

    println!("=== Seed Demo School ===");

    let pool = db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;

    if args.reset {
        println!("Truncating school tables...");
        sqlx::raw_sql(
            "TRUNCATE audit_log, attendance, fees, grades, exam_subjects, exams, subjects,
                      students, class_assignments, users CASCADE",
        )
        .execute(&pool)
        .await?;
    }

    let store = PgStore::new(&pool);
    if store.find_user_by_email("admin@demo.school").await?.is_some() {
        anyhow::bail!("Demo data already present; run again with --reset");
    }

    // 1. Users
    let hash = AuthService::hash_password(&demo_password)?;
    let admin = store
        .insert_user(user("admin@demo.school", "Priya", "Kulkarni", UserRole::Admin, &hash))
        .await?;
    let teacher = store
        .insert_user(user("teacher@demo.school", "Suresh", "Pillai", UserRole::Teacher, &hash))
        .await?;
    let staff = store
        .insert_user(user("accounts@demo.school", "Neha", "Verma", UserRole::Staff, &hash))
        .await?;
    println!("  Users: {}, {}, {}", admin.email, teacher.email, staff.email);

    let principal = Principal {
        user_id: admin.id,
        role: UserRole::Admin,
        assignments: vec![],
        policy: AccessPolicy::Legacy,
    };
    AccessService::assign(
        &store,
        &principal,
        teacher.id,
        &CreateAssignmentRequest {
            class: CLASS.into(),
            section: SECTION.into(),
        },
    )
    .await?;

    // 2. Students
    let mut students = Vec::new();
    for (i, (first, last)) in STUDENTS.iter().enumerate() {
        let student = StudentService::create(
            &store,
            &principal,
            &CreateStudentRequest {
                roll_number: (i + 1).to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                class: CLASS.into(),
                section: SECTION.into(),
                guardian_name: Some(format!("Parent of {first}")),
                guardian_phone: Some(format!("+91 98450 {:05}", 10000 + i * 37)),
                guardian_email: None,
                date_of_birth: NaiveDate::from_ymd_opt(2012, (i % 12) as u32 + 1, 10),
                admission_date: NaiveDate::from_ymd_opt(2019, 6, 3),
            },
        )
        .await?;
        students.push(student);
    }
    println!("  Students: {}", students.len());

    // 3. Subjects, exam and marks
    for (name, code) in SUBJECTS {
        ExamService::create_subject(
            &store,
            &principal,
            &CreateSubjectRequest {
                name: name.to_string(),
                code: code.to_string(),
                class: Some(CLASS.into()),
                section: None,
            },
        )
        .await?;
    }
    let exam = ExamService::create(
        &store,
        &principal,
        &CreateExamRequest {
            name: "Term 1 Examination".into(),
            class: CLASS.into(),
            section: SECTION.into(),
            academic_year: ACADEMIC_YEAR.into(),
            exam_date: NaiveDate::from_ymd_opt(2025, 9, 22),
            total_marks: None,
            subjects: None,
        },
    )
    .await?;

    let mut entries = Vec::new();
    for student in &students {
        for es in &exam.subjects {
            let marks = if rng.gen_bool(0.03) {
                "AB".to_string()
            } else {
                format!("{}", rng.gen_range(35..=100))
            };
            entries.push(MarkEntry {
                student_id: student.id,
                exam_subject_id: es.id,
                marks_obtained: marks,
            });
        }
    }
    let saved = GradeService::save_marks(&store, &principal, exam.exam.id, &entries).await?;
    println!("  Exam '{}': {} marks", exam.exam.name, saved.len());

    // 4. Fees
    let ids: Vec<Uuid> = students.iter().map(|s| s.id).collect();
    for (fee_type, amount, due) in [
        ("tuition", 12000.0, NaiveDate::from_ymd_opt(2025, 7, 10)),
        ("transport", 3000.0, NaiveDate::from_ymd_opt(2025, 7, 15)),
    ] {
        FeeService::create_due(
            &store,
            &principal,
            &CreateDueRequest {
                student_ids: ids.clone(),
                fee_type: fee_type.into(),
                amount,
                due_date: due.context("invalid due date")?,
                academic_year: ACADEMIC_YEAR.into(),
                term: "Term 1".into(),
            },
        )
        .await?;
    }

    let today = Utc::now().date_naive();
    let dues = store
        .list_fees(&FeeFilter {
            statuses: Some(vec![FeeStatus::Pending]),
            ..Default::default()
        })
        .await?;
    let mut payments = 0;
    for due in dues {
        match rng.gen_range(0..3) {
            0 => {}
            1 => {
                let part = (due.amount * 0.4).round();
                FeeService::record_payment(&store, &principal, due.id, part, today).await?;
                payments += 1;
            }
            _ => {
                FeeService::record_payment(&store, &principal, due.id, due.amount, today).await?;
                payments += 1;
            }
        }
    }
    println!("  Fees: {} dues, {} payments", students.len() * 2, payments);

    // 5. Attendance
    let days = school_days(today, 10);
    let mut records = Vec::new();
    for day in &days {
        for student in &students {
            let roll: u32 = rng.gen_range(0..100);
            let status = match roll {
                0..=79 => AttendanceStatus::Present,
                80..=89 => AttendanceStatus::Late,
                90..=96 => AttendanceStatus::Absent,
                _ => AttendanceStatus::Excused,
            };
            records.push(AttendanceEntry {
                student_id: student.id,
                date: *day,
                status,
                remarks: None,
            });
        }
    }
    let marked = AttendanceService::mark(&store, &principal, &records).await?;
    println!("  Attendance: {} rows over {} days", marked.len(), days.len());

    println!("=== Done. Log in as admin@demo.school with DEMO_PASSWORD ===");
    Ok(())
}
