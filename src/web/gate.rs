use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;

use crate::auth;
use crate::outcome::Outcome;

/// Inbound integrity check shared by every signed endpoint.
#[derive(Clone)]
pub struct RequestGate {
    secret: Arc<[u8]>,
    window: i64,
}

impl RequestGate {
    pub fn new(secret: Vec<u8>, window: i64) -> Self {
        Self {
            secret: secret.into(),
            window,
        }
    }

    /// Admits a request whose operation fields were already found present.
    ///
    /// A missing `timestamp` or `hmac_sign` is `MISSING_DATA`; a timestamp that
    /// is not a plain integer, a stale timestamp and a wrong signature are all
    /// the same `HMAC_ERROR`.
    pub fn admit(
        &self,
        operation: &str,
        fields: &[&str],
        timestamp: Option<&str>,
        signature: Option<&str>,
    ) -> Result<(), Outcome> {
        let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
            warn!("[gate] {} rejected: timestamp or hmac_sign missing", operation);
            return Err(Outcome::missing_data());
        };

        let Ok(timestamp) = timestamp.parse::<i64>() else {
            warn!("[gate] {} rejected: timestamp is not an integer", operation);
            return Err(Outcome::hmac_error());
        };

        let now = Utc::now().timestamp();
        if !auth::verify(fields, timestamp, signature, &self.secret, now, self.window) {
            warn!(
                "[gate] {} rejected: bad signature or stale timestamp (skew {}s)",
                operation,
                now.saturating_sub(timestamp)
            );
            return Err(Outcome::hmac_error());
        }

        debug!("[gate] {} admitted", operation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{HMAC_ERROR, MISSING_DATA};

    const SECRET: &[u8] = b"gate-secret";

    fn gate() -> RequestGate {
        RequestGate::new(SECRET.to_vec(), auth::DEFAULT_WINDOW_SECS)
    }

    fn code(result: Result<(), Outcome>) -> Option<String> {
        result.err().and_then(|o| o.error_code().map(str::to_string))
    }

    #[test]
    fn admits_fresh_signed_request() {
        let now = Utc::now().timestamp();
        let sig = auth::sign(&["a@example.com"], now, SECRET);
        assert!(gate()
            .admit("test", &["a@example.com"], Some(&now.to_string()), Some(&sig))
            .is_ok());
    }

    #[test]
    fn missing_timestamp_or_signature_is_missing_data() {
        let gate = gate();
        assert_eq!(code(gate.admit("test", &[], None, Some("ab"))).as_deref(), Some(MISSING_DATA));
        assert_eq!(code(gate.admit("test", &[], Some("1"), None)).as_deref(), Some(MISSING_DATA));
    }

    #[test]
    fn non_integer_timestamp_is_hmac_error() {
        for ts in ["", "abc", "12.5", " 17"] {
            assert_eq!(
                code(gate().admit("test", &[], Some(ts), Some("00"))).as_deref(),
                Some(HMAC_ERROR),
                "{:?}",
                ts
            );
        }
    }

    #[test]
    fn stale_and_forged_requests_look_the_same() {
        let now = Utc::now().timestamp();
        let stale = now - 3600;
        let stale_sig = auth::sign(&[], stale, SECRET);
        let stale_result = gate().admit("test", &[], Some(&stale.to_string()), Some(&stale_sig));

        let forged_sig = auth::sign(&[], now, b"wrong");
        let forged_result = gate().admit("test", &[], Some(&now.to_string()), Some(&forged_sig));

        assert_eq!(stale_result, forged_result);
        assert_eq!(stale_result, Err(Outcome::hmac_error()));
    }
}
