use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionKind {
        Deposit,
        Withdraw,
        Transfer,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionStatus {
        Success,
        Failed,
        Pending,
    }

    /// History filter, passed as the `filter` query parameter.
    ///
    /// `Sent`/`Received` narrow to transfers where the caller is the
    /// sender/receiver.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum HistoryFilter {
        #[default]
        All,
        Deposit,
        Withdraw,
        Transfer,
        Sent,
        Received,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawNew {
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub balance_minor: i64,
    }

    /// Request body for a step-up challenge ahead of a high-value transfer.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChallengeNew {
        pub amount_minor: i64,
    }

    /// The code itself travels out-of-band, never in this response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChallengeAccepted {
        pub accepted: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        /// Recipient account id or display name, matched case-insensitively.
        pub recipient: String,
        pub amount_minor: i64,
        /// One-time code, required above the step-up threshold.
        pub otp: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferResponse {
        pub balance_minor: i64,
        /// Human-shareable reference code of the ledger record.
        pub reference: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryQuery {
        pub filter: Option<HistoryFilter>,
        /// 1-based page number.
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub reference: String,
        pub kind: TransactionKind,
        pub status: TransactionStatus,
        pub amount_minor: i64,
        /// Balance of the primary actor after the operation settled.
        pub balance_after_minor: i64,
        pub sender_name: Option<String>,
        pub receiver_name: Option<String>,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub transactions: Vec<TransactionView>,
        pub total: u64,
        pub page: u64,
        pub page_size: u64,
        pub total_pages: u64,
    }
}
