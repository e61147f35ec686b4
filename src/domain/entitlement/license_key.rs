//! License key issuance for licensed digital products.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{ProductId, Timestamp};

/// Issued keys expire after one year.
pub const KEY_VALIDITY_YEARS: u32 = 1;

/// Licensing model configured on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicensePolicy {
    /// One activation per purchase.
    Single,
    /// A small fixed pool of activations.
    Multiple,
    /// No activation tracking; no key is issued at all.
    Unlimited,
}

impl LicensePolicy {
    /// Activation cap for issued keys. `None` means no key is issued.
    pub fn max_activations(&self) -> Option<u32> {
        match self {
            LicensePolicy::Single => Some(1),
            LicensePolicy::Multiple => Some(5),
            LicensePolicy::Unlimited => None,
        }
    }
}

/// A license key granted by a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseKey {
    pub product_id: ProductId,
    pub key: String,
    pub max_activations: u32,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl LicenseKey {
    /// Issues a key under the given policy.
    ///
    /// Returns `None` for `Unlimited` products, which need no key.
    pub fn issue(product_id: ProductId, policy: LicensePolicy, now: Timestamp) -> Option<Self> {
        let max_activations = policy.max_activations()?;
        Some(Self {
            product_id,
            key: generate_key(),
            max_activations,
            issued_at: now,
            expires_at: now.add_years(KEY_VALIDITY_YEARS),
        })
    }
}

/// Formats 16 random hex chars as `XXXX-XXXX-XXXX-XXXX`.
fn generate_key() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}-{}-{}", &raw[0..4], &raw[4..8], &raw[8..12], &raw[12..16])
}
