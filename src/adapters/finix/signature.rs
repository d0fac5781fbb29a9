//! `Finix-Signature` verification.
//!
//! Header format: `timestamp=<unix seconds>, sig=<hex HMAC-SHA256>` where the
//! MAC covers `"<timestamp>.<raw body>"`.

use {
    crate::domain::error::PipelineError,
    hmac::{Hmac, Mac},
    sha2::Sha256,
    subtle::ConstantTimeEq,
};

pub const SIGNATURE_HEADER: &str = "finix-signature";

/// Accepted clock difference between signer and receiver.
pub const TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, PipelineError> {
        let mut timestamp = None;
        let mut signature = None;

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "timestamp" => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        PipelineError::Unauthorized("invalid signature timestamp".into())
                    })?)
                }
                "sig" => {
                    signature = Some(hex::decode(value).map_err(|_| {
                        PipelineError::Unauthorized("signature is not hex".into())
                    })?)
                }
                _ => {}
            }
        }

        match (timestamp, signature) {
            (Some(timestamp), Some(signature)) => Ok(Self {
                timestamp,
                signature,
            }),
            _ => Err(PipelineError::Unauthorized(
                "malformed Finix-Signature header".into(),
            )),
        }
    }
}

fn mac_for(body: &[u8], secret: &str, timestamp: i64) -> Result<Hmac<Sha256>, PipelineError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| PipelineError::Config("invalid webhook signing secret".into()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Produces a header value for `body`. Used by tests and local tooling.
pub fn sign(body: &[u8], secret: &str, timestamp: i64) -> Result<String, PipelineError> {
    let tag = mac_for(body, secret, timestamp)?.finalize().into_bytes();
    Ok(format!("timestamp={timestamp}, sig={}", hex::encode(tag)))
}

pub fn verify(header: &str, body: &[u8], secret: &str, now: i64) -> Result<(), PipelineError> {
    let parsed = SignatureHeader::parse(header)?;

    if now.abs_diff(parsed.timestamp) > TOLERANCE_SECS.unsigned_abs() {
        return Err(PipelineError::Unauthorized(
            "signature timestamp outside tolerance".into(),
        ));
    }

    let expected = mac_for(body, secret, parsed.timestamp)?
        .finalize()
        .into_bytes();
    if bool::from(expected.as_slice().ct_eq(&parsed.signature)) {
        Ok(())
    } else {
        Err(PipelineError::Unauthorized("signature mismatch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_finix_test";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn signed_body_verifies() {
        let body = br#"{"type":"transfer.updated"}"#;
        let header = sign(body, SECRET, NOW).unwrap();
        assert!(verify(&header, body, SECRET, NOW + 10).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign(br#"{"a":1}"#, SECRET, NOW).unwrap();
        assert!(verify(&header, br#"{"a":2}"#, SECRET, NOW).is_err());
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign(b"{}", SECRET, NOW).unwrap();
        assert!(verify(&header, b"{}", "other", NOW).is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let header = sign(b"{}", SECRET, NOW).unwrap();
        assert!(verify(&header, b"{}", SECRET, NOW + TOLERANCE_SECS + 1).is_err());
        assert!(verify(&header, b"{}", SECRET, NOW - TOLERANCE_SECS - 1).is_err());
    }

    #[test]
    fn malformed_headers_fail() {
        assert!(SignatureHeader::parse("").is_err());
        assert!(SignatureHeader::parse("timestamp=abc, sig=00").is_err());
        assert!(SignatureHeader::parse("timestamp=1, sig=zz").is_err());
        assert!(SignatureHeader::parse("sig=00ff").is_err());
    }
}
