use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::access::AccessPolicy;

text_enum! {
    pub enum UserRole {
        Admin => "admin",
        Teacher => "teacher",
        Staff => "staff",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A (user, class, section) grant. The same pair may be granted twice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ClassAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub class: String,
    pub section: String,
    pub created_at: DateTime<Utc>,
}

/// The acting user for one request: role, class-section grants and the
/// policy those grants are read under.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: UserRole,
    pub assignments: Vec<ClassAssignment>,
    #[serde(skip)]
    pub policy: AccessPolicy,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Request/Response DTOs
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub class: String,
    pub section: String,
}
