//! Value Objects for the storefront

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::VerificationError;

/// Order ids are decimal millisecond timestamps. Ids handed out by one
/// generator strictly increase, so two orders created in the same
/// millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct OrderIdGenerator { last: AtomicI64 }

impl OrderIdGenerator {
    pub const fn new() -> Self { Self { last: AtomicI64::new(0) } }

    pub fn next(&self) -> String { self.next_at(Utc::now().timestamp_millis()) }

    pub fn next_at(&self, now_ms: i64) -> String {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(prev + 1);
            match self.last.compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// One-time registration code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCode { code: String, expires_at: DateTime<Utc> }

impl VerificationCode {
    pub const VALIDITY_MINUTES: i64 = 10;

    pub fn generate(now: DateTime<Utc>) -> Self {
        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        Self::with_code(code, now)
    }

    pub fn with_code(code: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { code: code.into(), expires_at: now + Duration::minutes(Self::VALIDITY_MINUTES) }
    }

    pub fn code(&self) -> &str { &self.code }
    pub fn expires_at(&self) -> DateTime<Utc> { self.expires_at }
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now > self.expires_at }

    /// Expiry is checked before the code itself.
    pub fn check(&self, input: &str, now: DateTime<Utc>) -> Result<(), VerificationError> {
        if self.is_expired(now) { return Err(VerificationError::Expired); }
        if input.trim() != self.code { return Err(VerificationError::WrongCode); }
        Ok(())
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.code) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_ids_are_monotonic_within_a_millisecond() {
        let ids = OrderIdGenerator::new();
        let a = ids.next_at(1_700_000_000_000);
        let b = ids.next_at(1_700_000_000_000);
        let c = ids.next_at(1_699_999_999_999);
        assert_eq!(a, "1700000000000");
        assert_eq!(b, "1700000000001");
        assert_eq!(c, "1700000000002");
    }

    #[test]
    fn test_generated_code_has_six_digits() {
        let code = VerificationCode::generate(Utc::now());
        assert_eq!(code.code().len(), 6);
        assert!(code.code().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_code_expiry_and_mismatch() {
        let now = Utc::now();
        let code = VerificationCode::with_code("123456", now);
        assert_eq!(code.check("000000", now), Err(VerificationError::WrongCode));
        assert_eq!(code.check(" 123456 ", now), Ok(()));
        assert_eq!(code.check("123456", now + Duration::minutes(11)), Err(VerificationError::Expired));
    }
}
