//! Business limit policy.
//!
//! Pure, side-effect-free checks over a proposed operation and the current
//! account state. Thresholds are named configuration rather than inline
//! literals; `Default` carries the product values.

use crate::{EngineError, ResultEngine, util::format_minor};

/// The tiered limits the engine enforces, in minor units.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// Smallest accepted withdrawal.
    pub min_withdrawal: i64,
    /// Largest single withdrawal.
    pub max_withdrawal: i64,
    /// Largest single transfer.
    pub transfer_cap: i64,
    /// Cumulative transfer volume a sender may move per calendar day.
    pub daily_transfer_cap: i64,
    /// Balance a sender must retain after any transfer.
    pub minimum_balance: i64,
    /// Transfers strictly above this amount require a verified one-time code.
    pub step_up_threshold: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_withdrawal: 100_00,
            max_withdrawal: 50_000_00,
            transfer_cap: 20_000_00,
            daily_transfer_cap: 50_000_00,
            minimum_balance: 1_000_00,
            step_up_threshold: 10_000_00,
        }
    }
}

impl Limits {
    /// Deposits have no upper bound, and frozen accounts may still receive
    /// them.
    pub fn check_deposit(&self, amount_minor: i64) -> ResultEngine<()> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "deposit amount must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Bounds-only withdrawal check, cheap enough to run before any lock.
    pub fn check_withdrawal_bounds(&self, amount_minor: i64) -> ResultEngine<()> {
        if amount_minor < self.min_withdrawal {
            return Err(EngineError::InvalidAmount(format!(
                "minimum withdrawal is {}",
                format_minor(self.min_withdrawal)
            )));
        }
        if amount_minor > self.max_withdrawal {
            return Err(EngineError::InvalidAmount(format!(
                "single withdrawal limit is {}",
                format_minor(self.max_withdrawal)
            )));
        }
        Ok(())
    }

    /// Withdrawal checks that need the freshly locked account row.
    pub fn check_withdrawal_funds(
        &self,
        balance_minor: i64,
        is_frozen: bool,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        if is_frozen {
            return Err(EngineError::AccountFrozen(
                "withdrawals are blocked".to_string(),
            ));
        }
        if amount_minor > balance_minor {
            return Err(EngineError::InsufficientFunds(format!(
                "available: {}",
                format_minor(balance_minor)
            )));
        }
        Ok(())
    }

    pub fn check_transfer_amount(&self, amount_minor: i64) -> ResultEngine<()> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "transfer amount must be > 0".to_string(),
            ));
        }
        if amount_minor > self.transfer_cap {
            return Err(EngineError::TransferCap(format!(
                "single transfer limit is {}",
                format_minor(self.transfer_cap)
            )));
        }
        Ok(())
    }

    /// Sender-side checks that need the freshly locked sender row.
    pub fn check_transfer_sender(
        &self,
        balance_minor: i64,
        is_frozen: bool,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        if is_frozen {
            return Err(EngineError::AccountFrozen(
                "transfers are blocked".to_string(),
            ));
        }
        if balance_minor - amount_minor < self.minimum_balance {
            return Err(EngineError::MinimumBalance(format!(
                "a balance of {} must be maintained",
                format_minor(self.minimum_balance)
            )));
        }
        Ok(())
    }

    /// `prior_total_minor` must be computed from committed data only.
    pub fn check_daily_total(&self, prior_total_minor: i64, amount_minor: i64) -> ResultEngine<()> {
        if prior_total_minor + amount_minor > self.daily_transfer_cap {
            return Err(EngineError::DailyCapExceeded(format!(
                "remaining today: {}",
                format_minor(self.daily_transfer_cap - prior_total_minor)
            )));
        }
        Ok(())
    }

    pub fn requires_step_up(&self, amount_minor: i64) -> bool {
        amount_minor > self.step_up_threshold
    }
}
