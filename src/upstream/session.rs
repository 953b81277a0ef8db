use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::header::{HeaderMap, CONTENT_TYPE, SET_COOKIE};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

use super::{envelope, Failure};

pub const AUTH_COOKIE: &str = "ZM_ADMIN_AUTH_TOKEN";
pub const CSRF_HEADER: &str = "X-Zimbra-Csrf-Token";
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Token pair issued by the upstream after authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_token: String,
    pub csrf_token: String,
    pub acquired_at: DateTime<Utc>,
}

impl Credentials {
    pub fn cookie(&self) -> String {
        format!("{}={}", AUTH_COOKIE, self.auth_token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_token", &"<redacted>")
            .field("csrf_token", &"<redacted>")
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

#[axum::async_trait]
pub trait SessionManager: Send + Sync {
    /// Re-authenticates against the upstream and returns the fresh pair.
    async fn ensure_session(&self) -> Result<Credentials, Failure>;
    /// Last acquired pair, possibly stale.
    async fn credentials(&self) -> Option<Credentials>;
    async fn invalidate(&self);
}

struct Refresh {
    completed: u64,
    last: Option<Result<Credentials, Failure>>,
}

/// Admin session against the groupware server.
///
/// Acquisitions are serialized. Callers that queued up while an acquisition
/// was running take its result instead of issuing their own request; a
/// caller arriving afterwards always authenticates again.
pub struct AdminSession {
    http: reqwest::Client,
    auth_url: String,
    principal: String,
    secret: String,
    current: RwLock<Option<Credentials>>,
    refresh: Mutex<Refresh>,
    completed: AtomicU64,
}

impl AdminSession {
    pub fn new(http: reqwest::Client, upstream_url: &str, principal: &str, secret: &str) -> Self {
        Self {
            http,
            auth_url: format!("{}/service/admin/soap/AuthRequest", upstream_url),
            principal: principal.to_string(),
            secret: secret.to_string(),
            current: RwLock::new(None),
            refresh: Mutex::new(Refresh {
                completed: 0,
                last: None,
            }),
            completed: AtomicU64::new(0),
        }
    }

    async fn acquire(&self) -> Result<Credentials, Failure> {
        debug!("[session] authenticating as {}", self.principal);
        let response = self
            .http
            .post(&self.auth_url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(envelope::auth_request(&self.principal, &self.secret))
            .send()
            .await
            .map_err(|e| Failure::transport("AuthRequest", e))?;

        let status = response.status();
        let auth_token = cookie_value(response.headers(), AUTH_COOKIE);
        let csrf_token = header_value(response.headers(), CSRF_HEADER);
        let body = response
            .text()
            .await
            .map_err(|e| Failure::transport("AuthRequest", e))?;

        match (auth_token, csrf_token) {
            (Some(auth_token), Some(csrf_token)) => Ok(Credentials {
                auth_token,
                csrf_token,
                acquired_at: Utc::now(),
            }),
            (auth, csrf) => {
                debug!(
                    "[session] token pair incomplete: cookie={} csrf={}",
                    auth.is_some(),
                    csrf.is_some()
                );
                Err(Failure::from_body("AuthRequest", status.as_u16(), &body))
            }
        }
    }
}

#[axum::async_trait]
impl SessionManager for AdminSession {
    async fn ensure_session(&self) -> Result<Credentials, Failure> {
        let seen = self.completed.load(Ordering::Acquire);
        let mut refresh = self.refresh.lock().await;

        if refresh.completed > seen {
            if let Some(last) = &refresh.last {
                debug!("[session] sharing acquisition #{}", refresh.completed);
                return last.clone();
            }
        }

        let result = self.acquire().await;
        if let Ok(credentials) = &result {
            *self.current.write().await = Some(credentials.clone());
            info!("[session] admin session established for {}", self.principal);
        }

        refresh.completed += 1;
        refresh.last = Some(result.clone());
        self.completed.store(refresh.completed, Ordering::Release);
        result
    }

    async fn credentials(&self) -> Option<Credentials> {
        self.current.read().await.clone()
    }

    async fn invalidate(&self) {
        debug!("[session] credentials invalidated");
        *self.current.write().await = None;
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Value of cookie `name` among the `Set-Cookie` headers, if non-empty.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
