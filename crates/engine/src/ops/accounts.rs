use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, DatabaseTransaction, QueryFilter, QuerySelect,
    Statement,
    sea_query::{Expr, Func},
    prelude::*,
};

use crate::{EngineError, ResultEngine, accounts, util::normalize_identifier};

use super::Engine;

impl Engine {
    /// Locks an account row for the rest of the unit and returns its current
    /// state.
    ///
    /// This is the sole admission point for balance mutation: any operation
    /// that changes a balance must hold this lock before reading the balance
    /// it intends to change, otherwise two concurrent operations can compute
    /// from stale reads. The wait is bounded by `lock_wait`; elapsing
    /// surfaces as retryable [`EngineError::Busy`].
    pub(crate) async fn lock_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultEngine<accounts::Model> {
        let acquire = async {
            // Touch the row before reading it: FOR UPDATE takes the row lock
            // on server backends, while on sqlite the write makes this unit
            // the single writer so the read below cannot go stale.
            let backend = db_tx.get_database_backend();
            let touched = db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "UPDATE accounts SET balance_minor = balance_minor WHERE id = ?",
                    [account_id.into()],
                ))
                .await?;
            if touched.rows_affected() == 0 {
                return Err(EngineError::KeyNotFound("account not exists".to_string()));
            }

            accounts::Entity::find_by_id(account_id)
                .lock_exclusive()
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
        };

        match tokio::time::timeout(self.lock_wait, acquire).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Busy),
        }
    }

    /// Unconditional balance write. Valid only after [`Engine::lock_account`]
    /// on the same account in the same unit.
    pub(crate) async fn write_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: &str,
        balance_minor: i64,
    ) -> ResultEngine<()> {
        let model = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            balance_minor: ActiveValue::Set(balance_minor),
            ..Default::default()
        };
        model.update(db_tx).await?;
        Ok(())
    }

    /// Case-insensitive recipient lookup by account id or display name.
    ///
    /// Runs outside any unit of work: resolution happens before locking, and
    /// existence is re-confirmed by the lock itself. Keeping the read off the
    /// unit also keeps the unit's first statement a write, which is what
    /// serializes writers on sqlite.
    pub(crate) async fn resolve_recipient(&self, identifier: &str) -> ResultEngine<accounts::Model> {
        let normalized = normalize_identifier(identifier);
        accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(Expr::expr(Func::upper(Expr::col(accounts::Column::Id))).eq(normalized.clone()))
                    .add(Expr::expr(Func::upper(Expr::col(accounts::Column::Username))).eq(normalized)),
            )
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("recipient account not found".to_string()))
    }
}
