//! Upstream SOAP fault parsing.
//!
//! With `<format type="js"/>` the admin service reports failures as
//! `{"Body":{"Fault":{"Reason":{"Text":..},"Detail":{"Error":{"Code":..}}}}}`.
//! Anything else (HTML error pages, proxies, truncated bodies) is `Malformed`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFault {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FaultParse {
    Fault(UpstreamFault),
    Malformed,
}

#[derive(Deserialize)]
struct FaultEnvelope {
    #[serde(rename = "Body")]
    body: FaultBody,
}

#[derive(Deserialize)]
struct FaultBody {
    #[serde(rename = "Fault")]
    fault: FaultJs,
}

#[derive(Deserialize)]
struct FaultJs {
    #[serde(rename = "Reason")]
    reason: Reason,
    #[serde(rename = "Detail")]
    detail: Detail,
}

#[derive(Deserialize)]
struct Reason {
    #[serde(rename = "Text")]
    text: String,
}

#[derive(Deserialize)]
struct Detail {
    #[serde(rename = "Error")]
    error: ErrorCode,
}

#[derive(Deserialize)]
struct ErrorCode {
    #[serde(rename = "Code")]
    code: String,
}

pub fn parse_fault(body: &str) -> FaultParse {
    match serde_json::from_str::<FaultEnvelope>(body) {
        Ok(envelope) if !envelope.body.fault.detail.error.code.is_empty() => {
            FaultParse::Fault(UpstreamFault {
                code: envelope.body.fault.detail.error.code,
                reason: envelope.body.fault.reason.text,
            })
        }
        _ => FaultParse::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_SUCH_ACCOUNT: &str = r#"{"Header":{"context":{"_jsns":"urn:zimbra"}},"Body":{"Fault":{"Code":{"Value":"soap:Sender"},"Reason":{"Text":"no such account: ghost@example.com"},"Detail":{"Error":{"Code":"account.NO_SUCH_ACCOUNT","Trace":"qtp-1","_jsns":"urn:zimbra"}}}},"_jsns":"urn:zimbraSoap"}"#;

    #[test]
    fn parses_well_formed_fault() {
        assert_eq!(
            parse_fault(NO_SUCH_ACCOUNT),
            FaultParse::Fault(UpstreamFault {
                code: "account.NO_SUCH_ACCOUNT".to_string(),
                reason: "no such account: ghost@example.com".to_string(),
            })
        );
    }

    #[test]
    fn html_error_page_is_malformed() {
        let body = "<html><head><title>Error 502 Bad Gateway</title></head><body></body></html>";
        assert_eq!(parse_fault(body), FaultParse::Malformed);
    }

    #[test]
    fn truncated_body_is_malformed() {
        assert_eq!(parse_fault(&NO_SUCH_ACCOUNT[..80]), FaultParse::Malformed);
    }

    #[test]
    fn empty_body_is_malformed() {
        assert_eq!(parse_fault(""), FaultParse::Malformed);
    }

    #[test]
    fn fault_without_code_is_malformed() {
        let body = r#"{"Body":{"Fault":{"Reason":{"Text":"boom"},"Detail":{}}}}"#;
        assert_eq!(parse_fault(body), FaultParse::Malformed);
        let body = r#"{"Body":{"Fault":{"Reason":{"Text":"boom"},"Detail":{"Error":{"Code":""}}}}}"#;
        assert_eq!(parse_fault(body), FaultParse::Malformed);
    }

    #[test]
    fn success_body_is_not_a_fault() {
        let body = r#"{"Body":{"GetAccountResponse":{"account":[]}}}"#;
        assert_eq!(parse_fault(body), FaultParse::Malformed);
    }
}
