//! The module contains the errors the engine can return.
//!
//! Every rejection carries its own variant so callers can present a
//! specific, actionable reason instead of a generic failure.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Account is frozen: {0}")]
    AccountFrozen(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Minimum balance breached: {0}")]
    MinimumBalance(String),
    #[error("Transfer limit exceeded: {0}")]
    TransferCap(String),
    #[error("Daily transfer limit exceeded: {0}")]
    DailyCapExceeded(String),
    #[error("Self-transfers are not permitted")]
    SelfTransfer,
    #[error("High-value transfer requires a one-time code")]
    StepUpRequired,
    #[error("Invalid or expired one-time code")]
    OtpInvalidOrExpired,
    #[error("Ledger busy, retry the operation")]
    Busy,
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::AccountFrozen(a), Self::AccountFrozen(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::MinimumBalance(a), Self::MinimumBalance(b)) => a == b,
            (Self::TransferCap(a), Self::TransferCap(b)) => a == b,
            (Self::DailyCapExceeded(a), Self::DailyCapExceeded(b)) => a == b,
            (Self::SelfTransfer, Self::SelfTransfer) => true,
            (Self::StepUpRequired, Self::StepUpRequired) => true,
            (Self::OtpInvalidOrExpired, Self::OtpInvalidOrExpired) => true,
            (Self::Busy, Self::Busy) => true,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
