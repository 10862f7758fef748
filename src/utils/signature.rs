//! HMAC-SHA256 signing of webhook bodies.
//!
//! The signed string is `"{timestamp}.{payload}"` where `timestamp` is Unix
//! seconds, so a captured signature is only accepted inside the replay window.

use hmac::{Hmac, Mac};
use serde_json::Value as JsonValue;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::utils::time::unix_now;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";

/// Seconds a signature stays valid after its timestamp.
pub const REPLAY_WINDOW_SECS: i64 = 900;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub signature: String,
    pub timestamp: i64,
    pub signed_string: String,
}

/// String form of a JSON payload. Strings are taken as-is so an already
/// serialized body is not quoted a second time.
pub fn canonical_payload(payload: &JsonValue) -> String {
    match payload {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn sign(payload: &str, secret: &str) -> Result<SignedPayload> {
    sign_at(payload, secret, unix_now())
}

pub fn sign_json(payload: &JsonValue, secret: &str) -> Result<SignedPayload> {
    sign(&canonical_payload(payload), secret)
}

pub fn sign_at(payload: &str, secret: &str, timestamp: i64) -> Result<SignedPayload> {
    let signed_string = format!("{}.{}", timestamp, payload);
    let signature = compute_signature(secret, &signed_string)
        .ok_or_else(|| Error::Internal("failed to initialise HMAC-SHA256".into()))?;
    Ok(SignedPayload {
        signature,
        timestamp,
        signed_string,
    })
}

pub fn verify(payload: &str, signature: &str, timestamp: i64, secret: &str) -> bool {
    verify_at(payload, signature, timestamp, secret, unix_now())
}

pub fn verify_json(payload: &JsonValue, signature: &str, timestamp: i64, secret: &str) -> bool {
    verify(&canonical_payload(payload), signature, timestamp, secret)
}

fn verify_at(payload: &str, signature: &str, timestamp: i64, secret: &str, now: i64) -> bool {
    let fresh = now
        .checked_sub(timestamp)
        .map_or(false, |age| age <= REPLAY_WINDOW_SECS);
    if !fresh {
        return false;
    }
    let Some(expected) = compute_signature(secret, &format!("{}.{}", timestamp, payload)) else {
        return false;
    };
    ConstantTimeEq::ct_eq(signature.as_bytes(), expected.as_bytes()).into()
}

fn compute_signature(secret: &str, signed_string: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(signed_string.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}
