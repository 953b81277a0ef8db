use hmac::{Hmac, Mac};
use sha3::Sha3_512;

type HmacSha3 = Hmac<Sha3_512>;

pub const DEFAULT_WINDOW_SECS: i64 = 30;

/// Timestamps at or above this magnitude are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// The exact byte string a client signs: the decimal timestamp followed by
/// every field value in the operation's declared order, with no separators.
pub fn canonical_message(timestamp: i64, fields: &[&str]) -> String {
    let mut message = timestamp.to_string();
    for field in fields {
        message.push_str(field);
    }
    message
}

fn keyed(secret: &[u8], timestamp: i64, fields: &[&str]) -> HmacSha3 {
    let mut mac = HmacSha3::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(canonical_message(timestamp, fields).as_bytes());
    mac
}

/// Lowercase hex HMAC-SHA3-512 of the canonical message.
pub fn sign(fields: &[&str], timestamp: i64, secret: &[u8]) -> String {
    hex::encode(keyed(secret, timestamp, fields).finalize().into_bytes())
}

fn to_seconds(timestamp: i64) -> i64 {
    if timestamp.unsigned_abs() >= MILLIS_THRESHOLD as u64 {
        timestamp / 1000
    } else {
        timestamp
    }
}

pub fn is_fresh(timestamp: i64, now: i64, window: i64) -> bool {
    now.abs_diff(to_seconds(timestamp)) <= window.max(0) as u64
}

/// Checks freshness and signature. Both failures answer `false` alike.
pub fn verify(
    fields: &[&str],
    timestamp: i64,
    signature: &str,
    secret: &[u8],
    now: i64,
    window: i64,
) -> bool {
    if !is_fresh(timestamp, now, window) {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    keyed(secret, timestamp, fields)
        .verify_slice(&expected)
        .is_ok()
}
