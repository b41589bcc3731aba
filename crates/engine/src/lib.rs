pub use audit::AuditSink;
pub use commands::{DepositCmd, HistoryCmd, TransferCmd, WithdrawCmd};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, HistoryFilter, HistoryItem, HistoryPage, TransferReceipt};
pub use otp::{ChallengeNotifier, NullNotifier, OtpStore};
pub use policy::Limits;
pub use records::{TransactionKind, TransactionRecord, TransactionStatus};

pub mod accounts;
mod audit;
mod commands;
mod error;
mod ops;
mod otp;
mod policy;
mod records;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
