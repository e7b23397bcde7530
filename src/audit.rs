use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{entity::audit_logs, error::AppResult};

/// One row of the audit trail.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub actor: Option<Uuid>,
    pub action: &'static str,
    pub resource: &'static str,
    pub metadata: Value,
}

impl AuditEntry {
    pub fn new(actor: Option<Uuid>, action: &'static str, resource: &'static str, metadata: Value) -> Self {
        Self {
            actor,
            action,
            resource,
            metadata,
        }
    }

    pub async fn write<C: ConnectionTrait>(self, conn: &C) -> AppResult<audit_logs::Model> {
        let row = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.actor),
            action: Set(self.action.to_string()),
            resource: Set(Some(self.resource.to_string())),
            metadata: Set(Some(self.metadata)),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(row)
    }
}

/// Best-effort audit write: failures are logged and swallowed.
pub async fn record<C: ConnectionTrait>(conn: &C, entry: AuditEntry) {
    let action = entry.action;
    if let Err(err) = entry.write(conn).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
