use std::sync::Arc;

use uuid::Uuid;

use crate::store::SchoolStore;

/// An audit log entry to record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub detail: Option<String>,
}

impl AuditEntry {
    pub fn new(user_id: Uuid, action: &str, resource_type: &str, resource_id: impl ToString) -> Self {
        Self {
            user_id: Some(user_id),
            action: action.to_string(),
            resource_type: Some(resource_type.to_string()),
            resource_id: Some(resource_id.to_string()),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Fire-and-forget audit log entry.
/// Spawns a background task, never blocks the request handler and never
/// propagates errors (logs a warning on failure).
pub fn log(store: Arc<dyn SchoolStore>, entry: AuditEntry) {
    tokio::spawn(async move {
        let action = entry.action.clone();
        if let Err(e) = store.append_audit(entry).await {
            tracing::warn!("audit log insert failed for {action}: {e}");
        }
    });
}
