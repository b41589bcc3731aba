//! Best-effort audit trail.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, DatabaseTransaction, entity::prelude::*};

/// Append-only audit entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: Option<String>,
    pub action: String,
    /// Network address the request originated from.
    pub origin: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writes audit entries without ever failing the owning operation.
///
/// When a unit of work is supplied the entry joins that commit; otherwise it
/// is written on the sink's own connection. Failures are logged and
/// swallowed: a successful financial commit is never converted into a
/// failure by its audit trail.
#[derive(Clone, Debug)]
pub struct AuditSink {
    database: DatabaseConnection,
}

impl AuditSink {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub async fn record(
        &self,
        unit: Option<&DatabaseTransaction>,
        account_id: Option<&str>,
        action: &str,
        origin: Option<&str>,
        at: DateTime<Utc>,
    ) {
        let entry = ActiveModel {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(account_id.map(ToString::to_string)),
            action: ActiveValue::Set(action.to_string()),
            origin: ActiveValue::Set(origin.map(ToString::to_string)),
            created_at: ActiveValue::Set(at),
        };
        let result = match unit {
            Some(db_tx) => entry.insert(db_tx).await,
            None => entry.insert(&self.database).await,
        };
        if let Err(err) = result {
            tracing::warn!("audit write failed for action {action:?}: {err}");
        }
    }
}
