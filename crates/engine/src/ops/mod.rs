use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{AuditSink, ChallengeNotifier, Limits, NullNotifier, OtpStore, ResultEngine};

mod accounts;
mod transactions;

pub use transactions::{HistoryFilter, HistoryItem, HistoryPage, TransferReceipt};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    limits: Limits,
    lock_wait: Duration,
    otp: Arc<OtpStore>,
    notifier: Arc<dyn ChallengeNotifier>,
    audit: AuditSink,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The limit policy this engine enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    limits: Option<Limits>,
    lock_wait: Option<Duration>,
    otp: Option<Arc<OtpStore>>,
    notifier: Option<Arc<dyn ChallengeNotifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default limit policy.
    pub fn limits(mut self, limits: Limits) -> EngineBuilder {
        self.limits = Some(limits);
        self
    }

    /// Bound on how long a single row-lock acquisition may wait before the
    /// operation surfaces as retryable `Busy`.
    pub fn lock_wait(mut self, lock_wait: Duration) -> EngineBuilder {
        self.lock_wait = Some(lock_wait);
        self
    }

    /// Inject the challenge store shared with other engine consumers.
    pub fn otp_store(mut self, otp: Arc<OtpStore>) -> EngineBuilder {
        self.otp = Some(otp);
        self
    }

    /// Side channel used to deliver issued one-time codes.
    pub fn notifier(mut self, notifier: Arc<dyn ChallengeNotifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            audit: AuditSink::new(self.database.clone()),
            limits: self.limits.unwrap_or_default(),
            lock_wait: self.lock_wait.unwrap_or(DEFAULT_LOCK_WAIT),
            otp: self.otp.unwrap_or_default(),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(NullNotifier)),
            database: self.database,
        })
    }
}
