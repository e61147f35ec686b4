//! Transaction identifiers.
//!
//! A transaction id is the stable, globally unique handle shared with
//! the payment gateway. Format: `TXN-<YYYYMMDDHHMMSS>-<8 hex chars>`.
//! Uniqueness is enforced at the repository level; the random suffix
//! only makes collisions rare, the initiator still collision-checks
//! before use.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Globally unique payment transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generates a fresh candidate id from the current time plus a
    /// random suffix.
    pub fn generate(now: Timestamp) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("TXN-{}-{}", now.compact(), &suffix[..8]))
    }

    /// Wraps an existing id read back from storage or the wire.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("transaction_id"));
        }
        Ok(Self(raw))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
