//! Ledger record primitives.
//!
//! A `TransactionRecord` is one immutable ledger row. It is written exactly
//! once, atomically with the balance mutation(s) it represents, and never
//! updated in place; corrections happen through new compensating records.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
            Self::Transfer => "TRANSFER",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAW" => Ok(Self::Withdraw),
            "TRANSFER" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Pending => "PENDING",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "PENDING" => Ok(Self::Pending),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Internal sequence number assigned by the store.
    pub id: i64,
    /// Human-shareable reference code, unique per record.
    pub reference: String,
    /// `None` for deposits.
    pub sender_id: Option<String>,
    /// `None` for withdrawals.
    pub receiver_id: Option<String>,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    /// Balance of the primary actor after the operation settled.
    pub balance_after_minor: i64,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub reference: String,
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub amount_minor: i64,
    pub kind: String,
    pub balance_after_minor: i64,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SenderId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ReceiverId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for TransactionRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            reference: model.reference,
            sender_id: model.sender_id,
            receiver_id: model.receiver_id,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            balance_after_minor: model.balance_after_minor,
            status: TransactionStatus::try_from(model.status.as_str())?,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
