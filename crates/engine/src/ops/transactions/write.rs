use chrono::{DateTime, Utc};

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, Statement, TransactionTrait, prelude::*,
};

use crate::util::{
    day_start, format_minor, normalize_identifier, normalize_optional_text, reference_code,
};
use crate::{
    DepositCmd, EngineError, ResultEngine, TransactionKind, TransactionStatus, TransferCmd,
    WithdrawCmd, accounts, records,
};

use super::super::{Engine, with_tx};

/// Outcome of a settled transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Sender balance after the transfer.
    pub balance_minor: i64,
    /// Human-shareable reference code of the ledger record.
    pub reference: String,
}

/// Fields of one ledger row to append. The reference code and SUCCESS status
/// are filled in by [`Engine::append_record`].
struct RecordRow {
    kind: TransactionKind,
    sender_id: Option<String>,
    receiver_id: Option<String>,
    amount_minor: i64,
    balance_after_minor: i64,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Engine {
    /// Credits an account and appends a DEPOSIT record.
    ///
    /// Frozen accounts still accept deposits; the freeze flag only blocks
    /// withdrawals and transfers.
    pub async fn deposit(&self, cmd: DepositCmd) -> ResultEngine<i64> {
        let DepositCmd {
            account_id,
            amount_minor,
            description,
            origin,
            now,
        } = cmd;
        self.limits.check_deposit(amount_minor)?;
        let description = normalize_optional_text(description.as_deref());

        with_tx!(self, |db_tx| {
            let account = self.lock_account(&db_tx, &account_id).await?;
            let new_balance = account
                .balance_minor
                .checked_add(amount_minor)
                .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
            self.write_balance(&db_tx, &account_id, new_balance).await?;
            self.append_record(
                &db_tx,
                RecordRow {
                    kind: TransactionKind::Deposit,
                    sender_id: None,
                    receiver_id: Some(account_id.clone()),
                    amount_minor,
                    balance_after_minor: new_balance,
                    description,
                    created_at: now,
                },
            )
            .await?;
            self.audit
                .record(
                    Some(&db_tx),
                    Some(&account_id),
                    &format!("Credit: {}", format_minor(amount_minor)),
                    origin.as_deref(),
                    now,
                )
                .await;
            Ok(new_balance)
        })
    }

    /// Debits an account and appends a WITHDRAW record.
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<i64> {
        let WithdrawCmd {
            account_id,
            amount_minor,
            description,
            origin,
            now,
        } = cmd;
        // Cheap bound rejects before touching the store.
        self.limits.check_withdrawal_bounds(amount_minor)?;
        let description = normalize_optional_text(description.as_deref());

        with_tx!(self, |db_tx| {
            let account = self.lock_account(&db_tx, &account_id).await?;
            // Freeze and sufficiency re-checked on the just-locked balance.
            self.limits.check_withdrawal_funds(
                account.balance_minor,
                account.is_frozen,
                amount_minor,
            )?;
            let new_balance = account.balance_minor - amount_minor;
            self.write_balance(&db_tx, &account_id, new_balance).await?;
            self.append_record(
                &db_tx,
                RecordRow {
                    kind: TransactionKind::Withdraw,
                    sender_id: Some(account_id.clone()),
                    receiver_id: None,
                    amount_minor,
                    balance_after_minor: new_balance,
                    description,
                    created_at: now,
                },
            )
            .await?;
            self.audit
                .record(
                    Some(&db_tx),
                    Some(&account_id),
                    &format!("Debit: {}", format_minor(amount_minor)),
                    origin.as_deref(),
                    now,
                )
                .await;
            Ok(new_balance)
        })
    }

    /// Issues a one-time code for a pending high-value transfer.
    ///
    /// The code leaves the engine only through the injected notifier, never
    /// through a return value or a log line.
    pub async fn request_transfer_challenge(
        &self,
        account_id: &str,
        amount_minor: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if !self.limits.requires_step_up(amount_minor) {
            return Err(EngineError::InvalidAmount(format!(
                "a one-time code is only required for transfers above {}",
                format_minor(self.limits.step_up_threshold)
            )));
        }
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;

        let code = self.otp.issue(&account.id, now);
        self.notifier.deliver(&account.id, &code);
        Ok(())
    }

    /// Moves funds between two accounts and appends one TRANSFER record.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        let TransferCmd {
            sender_id,
            recipient,
            amount_minor,
            otp,
            description,
            origin,
            now,
        } = cmd;
        self.limits.check_transfer_amount(amount_minor)?;
        if normalize_identifier(&recipient) == normalize_identifier(&sender_id) {
            return Err(EngineError::SelfTransfer);
        }
        // Step-up runs strictly before the unit: a consumed code never spans
        // an open transaction.
        if self.limits.requires_step_up(amount_minor) {
            let code = otp.as_deref().ok_or(EngineError::StepUpRequired)?;
            self.otp.verify_and_consume(&sender_id, code, now)?;
        }
        let description = normalize_optional_text(description.as_deref());

        // Resolved before locking; existence is re-confirmed under lock
        // below since the account set can change in between.
        let receiver = self.resolve_recipient(&recipient).await?;
        if receiver.id == sender_id {
            return Err(EngineError::SelfTransfer);
        }

        with_tx!(self, |db_tx| {
            // Both rows locked in ascending id order before either balance
            // moves, so two opposing transfers cannot deadlock.
            let (sender, receiver) = if sender_id < receiver.id {
                let sender = self.lock_account(&db_tx, &sender_id).await?;
                let receiver = self.lock_account(&db_tx, &receiver.id).await?;
                (sender, receiver)
            } else {
                let receiver = self.lock_account(&db_tx, &receiver.id).await?;
                let sender = self.lock_account(&db_tx, &sender_id).await?;
                (sender, receiver)
            };

            self.limits
                .check_transfer_sender(sender.balance_minor, sender.is_frozen, amount_minor)?;

            // Committed data only, and only after the sender lock: concurrent
            // transfers from one sender serialize on that lock, so each sees
            // the previous one's committed total.
            let prior_total = self
                .daily_transfer_total(&db_tx, &sender.id, day_start(now))
                .await?;
            self.limits.check_daily_total(prior_total, amount_minor)?;

            let sender_balance = sender.balance_minor - amount_minor;
            let receiver_balance = receiver
                .balance_minor
                .checked_add(amount_minor)
                .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
            self.write_balance(&db_tx, &sender.id, sender_balance)
                .await?;
            self.write_balance(&db_tx, &receiver.id, receiver_balance)
                .await?;

            let reference = self
                .append_record(
                    &db_tx,
                    RecordRow {
                        kind: TransactionKind::Transfer,
                        sender_id: Some(sender.id.clone()),
                        receiver_id: Some(receiver.id.clone()),
                        amount_minor,
                        balance_after_minor: sender_balance,
                        description,
                        created_at: now,
                    },
                )
                .await?;

            self.audit
                .record(
                    Some(&db_tx),
                    Some(&sender.id),
                    &format!(
                        "Transfer out: {} to {}",
                        format_minor(amount_minor),
                        receiver.username
                    ),
                    origin.as_deref(),
                    now,
                )
                .await;
            self.audit
                .record(
                    Some(&db_tx),
                    Some(&receiver.id),
                    &format!(
                        "Transfer in: {} from {}",
                        format_minor(amount_minor),
                        sender.username
                    ),
                    origin.as_deref(),
                    now,
                )
                .await;

            Ok(TransferReceipt {
                balance_minor: sender_balance,
                reference,
            })
        })
    }

    /// Appends one immutable ledger row and returns its reference code.
    async fn append_record(
        &self,
        db_tx: &DatabaseTransaction,
        row: RecordRow,
    ) -> ResultEngine<String> {
        let reference = reference_code();
        let model = records::ActiveModel {
            id: ActiveValue::NotSet,
            reference: ActiveValue::Set(reference.clone()),
            sender_id: ActiveValue::Set(row.sender_id),
            receiver_id: ActiveValue::Set(row.receiver_id),
            amount_minor: ActiveValue::Set(row.amount_minor),
            kind: ActiveValue::Set(row.kind.as_str().to_string()),
            balance_after_minor: ActiveValue::Set(row.balance_after_minor),
            status: ActiveValue::Set(TransactionStatus::Success.as_str().to_string()),
            description: ActiveValue::Set(row.description),
            created_at: ActiveValue::Set(row.created_at),
        };
        model.insert(db_tx).await?;
        Ok(reference)
    }

    /// Sum of the sender's committed TRANSFER volume since `since`.
    ///
    /// Evaluated before the new record is appended, so the transaction being
    /// validated never counts against itself.
    async fn daily_transfer_total(
        &self,
        db_tx: &DatabaseTransaction,
        sender_id: &str,
        since: DateTime<Utc>,
    ) -> ResultEngine<i64> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS total \
             FROM transactions \
             WHERE sender_id = ? AND kind = ? AND created_at >= ?",
            [
                sender_id.into(),
                TransactionKind::Transfer.as_str().into(),
                since.into(),
            ],
        );
        let row = db_tx.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "total").ok()).unwrap_or(0))
    }
}
