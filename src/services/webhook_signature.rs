// Payment provider webhook signature verification
// Header format: t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]
// Signed payload: "<t>.<raw body>", HMAC-SHA256 keyed with the endpoint secret

use ring::hmac;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    MissingHeader,

    #[error("malformed signature header: {0}")]
    Malformed(String),

    #[error("timestamp outside the tolerance window")]
    TimestampOutOfTolerance,

    #[error("no signature matches the payload")]
    NoMatchingSignature,
}

pub struct WebhookVerifier {
    key: hmac::Key,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: &str, tolerance_secs: u64) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            tolerance_secs,
        }
    }

    fn tag(&self, timestamp: i64, payload: &[u8]) -> hmac::Tag {
        let mut signed = format!("{}.", timestamp).into_bytes();
        signed.extend_from_slice(payload);
        hmac::sign(&self.key, &signed)
    }

    /// Hex signature of `payload` at `timestamp`
    pub fn sign(&self, timestamp: i64, payload: &[u8]) -> String {
        hex::encode(self.tag(timestamp, payload))
    }

    /// Header value a provider would send for `payload`
    pub fn header_for(&self, timestamp: i64, payload: &[u8]) -> String {
        format!("t={},v1={}", timestamp, self.sign(timestamp, payload))
    }

    pub fn verify(
        &self,
        header: Option<&str>,
        payload: &[u8],
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::MissingHeader)?;

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| SignatureError::Malformed(format!("bad element {:?}", part)))?;
            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        SignatureError::Malformed("timestamp is not an integer".to_string())
                    })?)
                },
                "v1" => candidates.push(value),
                // v0 and future schemes are ignored
                _ => {},
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| SignatureError::Malformed("missing timestamp".to_string()))?;
        if candidates.is_empty() {
            return Err(SignatureError::Malformed("missing v1 signature".to_string()));
        }

        if now_unix.abs_diff(timestamp) > self.tolerance_secs {
            return Err(SignatureError::TimestampOutOfTolerance);
        }

        let expected = self.tag(timestamp, payload);
        // Candidates that are not hex cannot match; every valid one is compared
        let matched = candidates
            .iter()
            .filter_map(|candidate| hex::decode(candidate).ok())
            .fold(0u8, |acc, candidate| {
                acc | expected.as_ref().ct_eq(candidate.as_slice()).unwrap_u8()
            });

        if matched == 1 {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }
}
