//! Payment lifecycle facts and the status derived from them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Independent boolean facts about a payment, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFacts(u16);

impl StatusFacts {
    pub const NONE: Self = Self(0);
    pub const CAPTURED: Self = Self(1 << 0);
    pub const AUTHORIZED: Self = Self(1 << 1);
    pub const PENDING: Self = Self(1 << 2);
    pub const FAILED: Self = Self(1 << 3);
    pub const CANCELED: Self = Self(1 << 4);
    pub const EXPIRED: Self = Self(1 << 5);
    pub const SUSPENDED: Self = Self(1 << 6);

    const ALL: u16 = 0b0111_1111;

    /// Builds facts from a raw mask, dropping unknown bits.
    pub fn from_bits(bits: u16) -> Self {
        Self(bits & Self::ALL)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for StatusFacts {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Captured,
    Authorized,
    Pending,
    Failed,
    Canceled,
    Expired,
    Suspended,
    Unknown,
}

/// Resolution order. The first rule whose fact is present wins.
const RULES: [(StatusFacts, PaymentStatus); 7] = [
    (StatusFacts::FAILED, PaymentStatus::Failed),
    (StatusFacts::CANCELED, PaymentStatus::Canceled),
    (StatusFacts::EXPIRED, PaymentStatus::Expired),
    (StatusFacts::SUSPENDED, PaymentStatus::Suspended),
    (StatusFacts::CAPTURED, PaymentStatus::Captured),
    (StatusFacts::AUTHORIZED, PaymentStatus::Authorized),
    (StatusFacts::PENDING, PaymentStatus::Pending),
];

impl PaymentStatus {
    /// Reduces a fact set to a single status.
    ///
    /// Never fails: a payment with no matching fact is `Unknown`.
    pub fn resolve(facts: StatusFacts) -> Self {
        RULES
            .iter()
            .find(|(mask, _)| facts.contains(*mask))
            .map(|(_, status)| *status)
            .unwrap_or(PaymentStatus::Unknown)
    }
}

impl AsRef<str> for PaymentStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Captured => "CAPTURED",
            Self::Authorized => "AUTHORIZED",
            Self::Pending => "PENDING",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Expired => "EXPIRED",
            Self::Suspended => "SUSPENDED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_facts_is_unknown() {
        assert_eq!(
            PaymentStatus::resolve(StatusFacts::NONE),
            PaymentStatus::Unknown
        );
    }

    #[test]
    fn test_single_facts() {
        let cases = [
            (StatusFacts::CAPTURED, PaymentStatus::Captured),
            (StatusFacts::AUTHORIZED, PaymentStatus::Authorized),
            (StatusFacts::PENDING, PaymentStatus::Pending),
            (StatusFacts::FAILED, PaymentStatus::Failed),
            (StatusFacts::CANCELED, PaymentStatus::Canceled),
            (StatusFacts::EXPIRED, PaymentStatus::Expired),
            (StatusFacts::SUSPENDED, PaymentStatus::Suspended),
        ];

        for (facts, expected) in cases {
            assert_eq!(PaymentStatus::resolve(facts), expected);
        }
    }

    #[test]
    fn test_captured_outranks_pending() {
        let facts = StatusFacts::PENDING | StatusFacts::CAPTURED;
        assert_eq!(PaymentStatus::resolve(facts), PaymentStatus::Captured);

        let facts = StatusFacts::CAPTURED | StatusFacts::PENDING;
        assert_eq!(PaymentStatus::resolve(facts), PaymentStatus::Captured);
    }

    #[test]
    fn test_failure_outranks_stale_pending() {
        let facts = StatusFacts::PENDING | StatusFacts::FAILED;
        assert_eq!(PaymentStatus::resolve(facts), PaymentStatus::Failed);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let facts = StatusFacts::AUTHORIZED | StatusFacts::PENDING | StatusFacts::SUSPENDED;
        let first = PaymentStatus::resolve(facts);
        for _ in 0..10 {
            assert_eq!(PaymentStatus::resolve(facts), first);
        }
        assert_eq!(first, PaymentStatus::Suspended);
    }

    #[test]
    fn test_from_bits_drops_unknown_bits() {
        let facts = StatusFacts::from_bits(0xFF00 | StatusFacts::PENDING.bits());
        assert_eq!(facts, StatusFacts::PENDING);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut facts = StatusFacts::PENDING;
        facts.insert(StatusFacts::CAPTURED);
        facts.remove(StatusFacts::PENDING);
        assert_eq!(facts, StatusFacts::CAPTURED);
        assert!(!facts.contains(StatusFacts::PENDING));
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&PaymentStatus::Captured).unwrap();
        assert_eq!(json, "\"CAPTURED\"");
    }
}
