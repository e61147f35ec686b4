//! Gateway IPN signature verification.
//!
//! The gateway signs every instant payment notification with
//! HMAC-SHA256 over `"{timestamp}.{body}"` and delivers the result in
//! a `Gateway-Signature` header of the form `t=<unix>,v1=<hex>`.
//! Verification is constant-time and bounds the timestamp to a short
//! window, so captured callbacks cannot be replayed later.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for a signed notification.
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for timestamps from the future.
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpnError {
    #[error("signature header missing or empty")]
    MissingHeader,

    #[error("signature header is malformed")]
    MalformedHeader,

    #[error("notification timestamp outside the accepted window")]
    TimestampOutOfWindow,

    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Parsed `Gateway-Signature` header.
#[derive(Debug, Clone)]
pub struct IpnSignature {
    pub timestamp: i64,
    pub signature: Vec<u8>,
}

impl IpnSignature {
    /// Parses `t=<unix>,v1=<hex>`.
    pub fn parse(header: &str) -> Result<Self, IpnError> {
        if header.is_empty() {
            return Err(IpnError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part.split_once('=').ok_or(IpnError::MalformedHeader)?;
            match key.trim() {
                "t" => {
                    timestamp =
                        Some(value.trim().parse().map_err(|_| IpnError::MalformedHeader)?);
                }
                "v1" => {
                    signature = Some(hex_decode(value.trim()).ok_or(IpnError::MalformedHeader)?);
                }
                // Unknown keys are ignored for forward compatibility.
                _ => {}
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(IpnError::MalformedHeader)?,
            signature: signature.ok_or(IpnError::MalformedHeader)?,
        })
    }
}

/// Verifies IPN signatures against the shared gateway secret.
pub struct IpnVerifier {
    secret: SecretString,
}

impl IpnVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Checks the signature and timestamp window for a raw IPN body.
    pub fn verify(&self, body: &[u8], header: &str) -> Result<(), IpnError> {
        self.verify_at(body, header, chrono::Utc::now().timestamp())
    }

    fn verify_at(&self, body: &[u8], header: &str, now_unix: i64) -> Result<(), IpnError> {
        let parsed = IpnSignature::parse(header)?;

        let age = now_unix - parsed.timestamp;
        if age > MAX_TIMESTAMP_AGE_SECS || age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                notification_timestamp = parsed.timestamp,
                age_secs = age,
                "IPN timestamp outside accepted window"
            );
            return Err(IpnError::TimestampOutOfWindow);
        }

        let signed_payload = format!("{}.{}", parsed.timestamp, String::from_utf8_lossy(body));
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| IpnError::SignatureMismatch)?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(&parsed.signature).unwrap_u8() != 1 {
            tracing::warn!("IPN signature mismatch");
            return Err(IpnError::SignatureMismatch);
        }

        Ok(())
    }
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        bytes.push(u8::from_str_radix(&hex[i..i + 2], 16).ok()?);
    }
    Some(bytes)
}
