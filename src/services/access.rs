//! Class-section access policy.
//!
//! Admins see every class-section. Other principals are limited to their
//! assignments, except that a non-admin with no assignments at all is
//! unrestricted under [`AccessPolicy::Legacy`]. [`AccessPolicy::Strict`]
//! closes that gap and gives such principals no access.

use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        auth::AuthenticatedUser,
        user::{ClassAssignment, CreateAssignmentRequest, Principal, UserRole},
    },
    services::metrics::ACCESS_DENIED_COUNTER,
    store::SchoolStore,
};

/// Every class the school runs, in display order.
pub const ALL_CLASSES: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12"];

/// Section alphabet shared by every class.
pub const ALL_SECTIONS: &[&str] = &["A", "B", "C", "D", "E", "F", "G"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Non-admins without assignments are unrestricted.
    #[default]
    Legacy,
    /// Non-admins without assignments see nothing.
    Strict,
}

enum Scope<'a> {
    Everything,
    Nothing,
    Assigned(&'a [ClassAssignment]),
}

fn scope(principal: &Principal) -> Scope<'_> {
    if principal.role == UserRole::Admin {
        return Scope::Everything;
    }
    if principal.assignments.is_empty() {
        return match principal.policy {
            AccessPolicy::Legacy => Scope::Everything,
            AccessPolicy::Strict => Scope::Nothing,
        };
    }
    Scope::Assigned(&principal.assignments)
}

/// Orders class labels numerically, falling back to text order for labels
/// that are not numbers.
fn class_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn available_classes(principal: &Principal) -> Vec<String> {
    match scope(principal) {
        Scope::Everything => ALL_CLASSES.iter().map(|c| c.to_string()).collect(),
        Scope::Nothing => vec![],
        Scope::Assigned(assignments) => {
            let mut classes: Vec<String> = assignments
                .iter()
                .map(|a| a.class.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            classes.sort_by(|a, b| class_order(a, b));
            classes
        }
    }
}

pub fn available_sections(principal: &Principal, class: Option<&str>) -> Vec<String> {
    match scope(principal) {
        Scope::Everything => ALL_SECTIONS.iter().map(|s| s.to_string()).collect(),
        Scope::Nothing => vec![],
        Scope::Assigned(assignments) => assignments
            .iter()
            .filter(|a| class.is_none_or(|c| a.class == c))
            .map(|a| a.section.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

pub fn can_access(principal: &Principal, class: &str, section: Option<&str>) -> bool {
    match scope(principal) {
        Scope::Everything => true,
        Scope::Nothing => false,
        Scope::Assigned(assignments) => assignments
            .iter()
            .any(|a| a.class == class && section.is_none_or(|s| a.section == s)),
    }
}

/// `can_access` as a guard, run before any query touching the class-section.
pub fn ensure_access(principal: &Principal, class: &str, section: Option<&str>) -> Result<()> {
    if can_access(principal, class, section) {
        return Ok(());
    }
    ACCESS_DENIED_COUNTER.inc();
    tracing::info!(user_id = %principal.user_id, class, section, "class-section access denied");
    let target = match section {
        Some(s) => format!("class {class} section {s}"),
        None => format!("class {class}"),
    };
    Err(AppError::AccessDenied(target))
}

pub fn ensure_admin(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        ACCESS_DENIED_COUNTER.inc();
        Err(AppError::AccessDenied("admin only".into()))
    }
}

pub fn validate_class_section(class: &str, section: &str) -> Result<()> {
    if !ALL_CLASSES.contains(&class) {
        return Err(AppError::validation("class", format!("Unknown class: {class}")));
    }
    if !ALL_SECTIONS.contains(&section) {
        return Err(AppError::validation("section", format!("Unknown section: {section}")));
    }
    Ok(())
}

pub struct AccessService;

impl AccessService {
    /// Builds the principal for one request from the token identity and the
    /// user's current assignments.
    pub async fn load_principal(
        store: &dyn SchoolStore,
        user: &AuthenticatedUser,
        policy: AccessPolicy,
    ) -> Result<Principal> {
        let account = store
            .get_user(user.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::AccessDenied("account is inactive".into()))?;
        let assignments = store.list_assignments(account.id).await?;
        Ok(Principal {
            user_id: account.id,
            role: account.role,
            assignments,
            policy,
        })
    }

    pub async fn list_assignments(
        store: &dyn SchoolStore,
        principal: &Principal,
        user_id: Uuid,
    ) -> Result<Vec<ClassAssignment>> {
        if principal.user_id != user_id {
            ensure_admin(principal)?;
        }
        Ok(store.list_assignments(user_id).await?)
    }

    pub async fn assign(
        store: &dyn SchoolStore,
        principal: &Principal,
        user_id: Uuid,
        req: &CreateAssignmentRequest,
    ) -> Result<ClassAssignment> {
        ensure_admin(principal)?;
        validate_class_section(&req.class, &req.section)?;
        store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        let assignment = ClassAssignment {
            id: Uuid::new_v4(),
            user_id,
            class: req.class.clone(),
            section: req.section.clone(),
            created_at: Utc::now(),
        };
        Ok(store.insert_assignment(assignment).await?)
    }

    pub async fn unassign(store: &dyn SchoolStore, principal: &Principal, id: Uuid) -> Result<()> {
        ensure_admin(principal)?;
        if !store.delete_assignment(id).await? {
            return Err(AppError::NotFound(format!("assignment {id}")));
        }
        Ok(())
    }
}
