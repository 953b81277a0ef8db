//! Client side of the gateway: session handling and the admin operations
//! forwarded to the groupware server.

pub mod client;
pub mod envelope;
pub mod fault;
pub mod preauth;
pub mod session;

use log::warn;

use crate::outcome::{Outcome, TRANSPORT_ERROR, UNEXPECTED_ERROR};
use fault::{FaultParse, UpstreamFault};

pub use client::ZimbraClient;
pub use session::{AdminSession, Credentials, SessionManager};

/// Why an upstream interaction did not succeed.
///
/// Transport and shape problems keep their detail for the log only; callers
/// see the generic code and text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Failure {
    #[error("upstream transport failure: {0}")]
    Transport(String),
    #[error("unexpected upstream response: {0}")]
    Unexpected(String),
    #[error("upstream fault {}: {}", .0.code, .0.reason)]
    Fault(UpstreamFault),
}

impl Failure {
    pub fn transport(context: &str, err: impl std::fmt::Display) -> Self {
        warn!("[upstream] {} failed: {}", context, err);
        Failure::Transport(format!("{}: {}", context, err))
    }

    pub fn unexpected(context: &str, detail: impl std::fmt::Display) -> Self {
        warn!("[upstream] {} returned an unexpected response: {}", context, detail);
        Failure::Unexpected(format!("{}: {}", context, detail))
    }

    /// Classifies an error body: a parseable fault is reported verbatim,
    /// anything else is `UNEXPECTED_ERROR`.
    pub fn from_body(context: &str, status: u16, body: &str) -> Self {
        match fault::parse_fault(body) {
            FaultParse::Fault(fault) => {
                warn!(
                    "[upstream] {} rejected with status {}: {} ({})",
                    context, status, fault.code, fault.reason
                );
                Failure::Fault(fault)
            }
            FaultParse::Malformed => Self::unexpected(
                context,
                format!("status {} with unparseable body of {} bytes", status, body.len()),
            ),
        }
    }

    pub fn fault_code(&self) -> Option<&str> {
        match self {
            Failure::Fault(fault) => Some(&fault.code),
            _ => None,
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Transport(_) => Outcome::error(TRANSPORT_ERROR, "Upstream server unreachable"),
            Failure::Unexpected(_) => Outcome::error(UNEXPECTED_ERROR, "Unexpected upstream response"),
            Failure::Fault(fault) => Outcome::error(fault.code, fault.reason),
        }
    }
}

/// Addresses an existing account or distribution list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(String),
    Name(String),
}

impl Target {
    /// Prefers the identifier when both are supplied; `None` when neither is.
    pub fn from_parts(id: &str, name: &str) -> Option<Self> {
        if !id.is_empty() {
            Some(Target::Id(id.to_string()))
        } else if !name.is_empty() {
            Some(Target::Name(name.to_string()))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub password: String,
    pub given_name: String,
    pub middle_name: String,
    pub surname: String,
}

#[derive(Debug, Clone)]
pub struct NewDistributionList {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub subscription_policy: String,
    pub unsubscription_policy: String,
}

/// The administrative operations the gateway exposes. Every method refreshes
/// the upstream session first and never fails outside its `Outcome`.
#[axum::async_trait]
pub trait AdminApi: Send + Sync {
    async fn create_account(&self, account: &NewAccount) -> Outcome;
    async fn delete_account(&self, target: &Target) -> Outcome;
    async fn get_account_info(&self, name: &str) -> Outcome;
    async fn get_messages(&self, name: &str, unread_only: bool) -> Outcome;
    async fn get_preauth_link(&self, name: &str) -> Outcome;
    async fn get_distribution_lists(&self) -> Outcome;
    async fn create_distribution_list(&self, list: &NewDistributionList) -> Outcome;
    async fn delete_distribution_list(&self, target: &Target) -> Outcome;
    async fn add_distribution_list_members(&self, target: &Target, members: &[String]) -> Outcome;
    async fn remove_distribution_list_members(&self, target: &Target, members: &[String]) -> Outcome;
}
