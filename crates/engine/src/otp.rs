//! One-time-code challenges for high-value transfers.
//!
//! Challenges live in process memory behind the injected store, keyed by
//! account id with at most one live challenge each. Running more than one
//! engine instance breaks the single-use guarantee; that deployment
//! constraint is documented rather than papered over.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::{EngineError, ResultEngine};

/// Side-channel delivery for issued codes.
///
/// Implementations must not place the code in any response body or log line.
pub trait ChallengeNotifier: Send + Sync + std::fmt::Debug {
    fn deliver(&self, account_id: &str, code: &str);
}

/// Discards codes. The safe default, and what tests usually want.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl ChallengeNotifier for NullNotifier {
    fn deliver(&self, account_id: &str, _code: &str) {
        tracing::debug!("one-time code issued for {account_id}");
    }
}

#[derive(Clone, Debug)]
struct Challenge {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Keyed store of live challenges.
#[derive(Debug)]
pub struct OtpStore {
    challenges: Mutex<HashMap<String, Challenge>>,
    ttl: Duration,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
    }
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            challenges: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issues a fresh 6-digit code, superseding any prior challenge for the
    /// account.
    pub fn issue(&self, account_id: &str, now: DateTime<Utc>) -> String {
        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        let challenge = Challenge {
            code: code.clone(),
            expires_at: now + self.ttl,
        };
        let mut challenges = self.challenges.lock().unwrap_or_else(|e| e.into_inner());
        challenges.insert(account_id.to_string(), challenge);
        code
    }

    /// Consumes the live challenge on an exact, unexpired match.
    ///
    /// A failed attempt leaves the challenge in place so the caller can retry
    /// without re-issuing.
    pub fn verify_and_consume(
        &self,
        account_id: &str,
        supplied: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let mut challenges = self.challenges.lock().unwrap_or_else(|e| e.into_inner());
        match challenges.get(account_id) {
            Some(challenge) if challenge.code == supplied && now < challenge.expires_at => {
                challenges.remove(account_id);
                Ok(())
            }
            _ => Err(EngineError::OtpInvalidOrExpired),
        }
    }
}
