//! Shipping priority encoded in product metafields and delivery-option titles.

use serde::{Deserialize, Serialize};

/// Integer rank of a shipping requirement.
///
/// Higher wins. Values come from strings such as `"2"` or
/// `"2 - express delivery"`; only the leading integer is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i64);

impl Priority {
    /// Create a priority from a raw value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Parse the leading base-10 integer of `raw`.
    ///
    /// Leading whitespace and a single sign are accepted; parsing stops at the
    /// first non-digit. Returns `None` when no digit is found or the value
    /// does not fit in an `i64`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim_start();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, trimmed.get(1..)?),
            Some(b'+') => (false, trimmed.get(1..)?),
            _ => (false, trimmed),
        };

        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let number = digits.get(..end).filter(|n| !n.is_empty())?;

        let value: i64 = number.parse().ok()?;
        Some(Self(if negative { -value } else { value }))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
