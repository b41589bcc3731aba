//! Command structs for engine operations.
//!
//! These types group parameters for the money-movement operations, keeping
//! call sites readable and avoiding long argument lists. Timestamps are
//! supplied by the caller so the engine stays deterministic under test.

use chrono::{DateTime, Utc};

use crate::HistoryFilter;

/// Credit an account.
#[derive(Clone, Debug)]
pub struct DepositCmd {
    pub account_id: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub origin: Option<String>,
    pub now: DateTime<Utc>,
}

impl DepositCmd {
    #[must_use]
    pub fn new(account_id: impl Into<String>, amount_minor: i64, now: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.into(),
            amount_minor,
            description: None,
            origin: None,
            now,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Debit an account.
#[derive(Clone, Debug)]
pub struct WithdrawCmd {
    pub account_id: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub origin: Option<String>,
    pub now: DateTime<Utc>,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(account_id: impl Into<String>, amount_minor: i64, now: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.into(),
            amount_minor,
            description: None,
            origin: None,
            now,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Move funds from a sender to a resolved recipient.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub sender_id: String,
    /// Recipient account id or display name, matched case-insensitively.
    pub recipient: String,
    pub amount_minor: i64,
    /// One-time code, required above the step-up threshold.
    pub otp: Option<String>,
    pub description: Option<String>,
    pub origin: Option<String>,
    pub now: DateTime<Utc>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        sender_id: impl Into<String>,
        recipient: impl Into<String>,
        amount_minor: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            recipient: recipient.into(),
            amount_minor,
            otp: None,
            description: None,
            origin: None,
            now,
        }
    }

    #[must_use]
    pub fn otp(mut self, otp: impl Into<String>) -> Self {
        self.otp = Some(otp.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Query an account's ledger history.
#[derive(Clone, Debug)]
pub struct HistoryCmd {
    pub account_id: String,
    pub filter: HistoryFilter,
    /// 1-based page number.
    pub page: u64,
    pub page_size: u64,
}

impl HistoryCmd {
    #[must_use]
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            filter: HistoryFilter::All,
            page: 1,
            page_size: 10,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: HistoryFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}
