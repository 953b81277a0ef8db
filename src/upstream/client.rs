use chrono::Utc;
use log::{debug, info};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Url;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::envelope::{self, NewAccountXml, NewDistributionListXml};
use super::fault::UpstreamFault;
use super::preauth;
use super::session::{Credentials, SessionManager, CSRF_HEADER, SOAP_CONTENT_TYPE};
use super::{AdminApi, Failure, NewAccount, NewDistributionList, Target};
use crate::outcome::Outcome;

const NO_SUCH_ACCOUNT: &str = "account.NO_SUCH_ACCOUNT";
const NO_SUCH_DISTRIBUTION_LIST: &str = "account.NO_SUCH_DISTRIBUTION_LIST";

type Object = Map<String, Value>;

/// Result of a lookup-by-name. A missing entity is not an error.
enum Lookup {
    Found(Object),
    Missing(UpstreamFault),
}

/// Admin operations against a Zimbra-style SOAP admin service.
pub struct ZimbraClient {
    http: reqwest::Client,
    upstream_url: String,
    web_client_url: String,
    sessions: Arc<dyn SessionManager>,
}

impl ZimbraClient {
    pub fn new(
        http: reqwest::Client,
        upstream_url: &str,
        web_client_url: &str,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            http,
            upstream_url: upstream_url.to_string(),
            web_client_url: web_client_url.to_string(),
            sessions,
        }
    }

    // ── Transport ─────────────────────────────────────────────────────────────

    /// Posts one admin request and returns the `…Response` element of the body.
    async fn call(
        &self,
        credentials: &Credentials,
        request: &str,
        body: String,
    ) -> Result<Object, Failure> {
        let url = format!("{}/service/admin/soap/{}", self.upstream_url, request);
        debug!("[upstream] POST {}", url);

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header(COOKIE, credentials.cookie())
            .header(CSRF_HEADER, credentials.csrf_token.as_str())
            .body(envelope::admin_request(&credentials.csrf_token, &body))
            .send()
            .await
            .map_err(|e| Failure::transport(request, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Failure::transport(request, e))?;

        if !status.is_success() {
            return Err(Failure::from_body(request, status.as_u16(), &text));
        }

        let mut value: Value =
            serde_json::from_str(&text).map_err(|e| Failure::unexpected(request, e))?;
        let Some(body) = value.get_mut("Body") else {
            return Err(Failure::unexpected(request, "response has no Body"));
        };
        if body.get("Fault").is_some() {
            return Err(Failure::from_body(request, status.as_u16(), &text));
        }

        let response_name = format!("{}Response", request.trim_end_matches("Request"));
        match body.get_mut(&response_name).map(Value::take) {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(Failure::unexpected(
                request,
                format!("Body has no {} object", response_name),
            )),
        }
    }

    async fn lookup(
        &self,
        credentials: &Credentials,
        request: &str,
        body: String,
        element: &str,
        not_found: &str,
    ) -> Result<Lookup, Failure> {
        match self.call(credentials, request, body).await {
            Ok(response) => first(&response, element)
                .cloned()
                .map(Lookup::Found)
                .ok_or_else(|| Failure::unexpected(request, format!("no {} entry", element))),
            Err(Failure::Fault(fault)) if fault.code == not_found => {
                debug!("[upstream] {} found nothing: {}", request, fault.reason);
                Ok(Lookup::Missing(fault))
            }
            Err(e) => Err(e),
        }
    }

    async fn lookup_account(&self, credentials: &Credentials, name: &str) -> Result<Lookup, Failure> {
        self.lookup(
            credentials,
            "GetAccountRequest",
            envelope::get_account_by_name(name),
            "account",
            NO_SUCH_ACCOUNT,
        )
        .await
    }

    async fn lookup_distribution_list(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<Lookup, Failure> {
        self.lookup(
            credentials,
            "GetDistributionListRequest",
            envelope::get_distribution_list_by_name(name),
            "dl",
            NO_SUCH_DISTRIBUTION_LIST,
        )
        .await
    }

    async fn resolve_distribution_list(
        &self,
        credentials: &Credentials,
        target: &Target,
    ) -> Result<Lookup, Failure> {
        match target {
            Target::Id(id) => {
                let mut entry = Object::new();
                entry.insert("id".to_string(), Value::String(id.clone()));
                Ok(Lookup::Found(entry))
            }
            Target::Name(name) => self.lookup_distribution_list(credentials, name).await,
        }
    }

    // ── Operations ────────────────────────────────────────────────────────────

    async fn try_create_account(&self, account: &NewAccount) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let xml = envelope::create_account(&NewAccountXml {
            name: &account.name,
            password: &account.password,
            given_name: &account.given_name,
            middle_name: &account.middle_name,
            surname: &account.surname,
        });
        let response = self.call(&credentials, "CreateAccountRequest", xml).await?;
        let (id, name) = identity(&response, "account", "CreateAccountRequest")?;
        info!("[upstream] created account {} ({})", name, id);
        Ok(json!({"id": id, "name": name}))
    }

    async fn try_delete_account(&self, target: &Target) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let id = match target {
            Target::Id(id) => id.clone(),
            Target::Name(name) => match self.lookup_account(&credentials, name).await? {
                Lookup::Found(entry) => string_field(&entry, "id", "GetAccountRequest")?,
                Lookup::Missing(_) => return Ok(json!({"exists": false})),
            },
        };
        self.call(&credentials, "DeleteAccountRequest", envelope::delete_account(&id))
            .await?;
        info!("[upstream] deleted account {}", id);
        Ok(json!({"id": id, "deleted": true}))
    }

    async fn try_get_account_info(&self, name: &str) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        match self.lookup_account(&credentials, name).await? {
            Lookup::Missing(_) => Ok(json!({"exists": false})),
            Lookup::Found(entry) => {
                let id = string_field(&entry, "id", "GetAccountRequest")?;
                let name = string_field(&entry, "name", "GetAccountRequest")?;
                let is_admin = attr(&entry, "zimbraIsAdminAccount")
                    .map(|v| v.eq_ignore_ascii_case("TRUE"))
                    .unwrap_or(false);
                Ok(json!({"exists": true, "id": id, "name": name, "isAdmin": is_admin}))
            }
        }
    }

    async fn try_get_messages(&self, name: &str, unread_only: bool) -> Result<Value, Failure> {
        const CONTEXT: &str = "mailbox listing";
        let credentials = self.sessions.ensure_session().await?;

        let mut url = Url::parse(&self.upstream_url).map_err(|e| Failure::unexpected(CONTEXT, e))?;
        url.path_segments_mut()
            .map_err(|_| Failure::unexpected(CONTEXT, "upstream url cannot be a base"))?
            .pop_if_empty()
            .extend(["home", name, "inbox"]);
        url.query_pairs_mut().append_pair("fmt", "json");
        if unread_only {
            url.query_pairs_mut().append_pair("query", "is:unread");
        }
        debug!("[upstream] GET {}", url);

        let response = self
            .http
            .get(url)
            .header(COOKIE, credentials.cookie())
            .send()
            .await
            .map_err(|e| Failure::transport(CONTEXT, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Failure::transport(CONTEXT, e))?;

        if !status.is_success() {
            return Err(Failure::from_body(CONTEXT, status.as_u16(), &text));
        }
        let messages = if text.trim().is_empty() {
            Value::Object(Object::new())
        } else {
            serde_json::from_str(&text).map_err(|e| Failure::unexpected(CONTEXT, e))?
        };
        Ok(json!({"messages": messages}))
    }

    async fn try_get_preauth_link(&self, name: &str) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let entry = match self.lookup_account(&credentials, name).await? {
            Lookup::Found(entry) => entry,
            Lookup::Missing(_) => return Ok(json!({"exists": false})),
        };
        let account = string_field(&entry, "name", "GetAccountRequest")?;
        let domain = preauth::domain_of(&account)
            .ok_or_else(|| Failure::unexpected("GetAccountRequest", "account name has no domain"))?;

        let response = self
            .call(
                &credentials,
                "GetDomainRequest",
                envelope::get_domain_preauth_key(domain),
            )
            .await?;
        let key = first(&response, "domain")
            .and_then(|d| attr(d, "zimbraPreAuthKey"))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Failure::unexpected("GetDomainRequest", format!("no preauth key for domain {}", domain))
            })?;

        let link = preauth::preauth_link(
            &self.web_client_url,
            key,
            &account,
            Utc::now().timestamp_millis(),
        )
        .map_err(|e| Failure::unexpected("preauth link", e))?;
        Ok(json!({"link": link}))
    }

    async fn try_get_distribution_lists(&self) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let response = self
            .call(
                &credentials,
                "GetAllDistributionListsRequest",
                envelope::get_all_distribution_lists(),
            )
            .await?;
        let lists = match response.get("dl") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(|dl| -> Result<Value, Failure> {
                    let (id, name) = identity_of(dl, "GetAllDistributionListsRequest")?;
                    Ok(json!({"id": id, "name": name}))
                })
                .collect::<Result<Vec<_>, Failure>>()?,
            Some(_) => {
                return Err(Failure::unexpected(
                    "GetAllDistributionListsRequest",
                    "dl is not a list",
                ))
            }
        };
        Ok(json!({"distributionLists": lists}))
    }

    async fn try_create_distribution_list(&self, list: &NewDistributionList) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let xml = envelope::create_distribution_list(&NewDistributionListXml {
            name: &list.name,
            display_name: &list.display_name,
            description: &list.description,
            subscription_policy: &list.subscription_policy,
            unsubscription_policy: &list.unsubscription_policy,
        });
        let response = self
            .call(&credentials, "CreateDistributionListRequest", xml)
            .await?;
        let (id, name) = identity(&response, "dl", "CreateDistributionListRequest")?;
        info!("[upstream] created distribution list {} ({})", name, id);
        Ok(json!({"id": id, "name": name}))
    }

    async fn try_delete_distribution_list(&self, target: &Target) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let id = match self.resolve_distribution_list(&credentials, target).await? {
            Lookup::Found(entry) => string_field(&entry, "id", "GetDistributionListRequest")?,
            Lookup::Missing(_) => return Ok(json!({"exists": false})),
        };
        self.call(
            &credentials,
            "DeleteDistributionListRequest",
            envelope::delete_distribution_list(&id),
        )
        .await?;
        info!("[upstream] deleted distribution list {}", id);
        Ok(json!({"id": id, "deleted": true}))
    }

    async fn try_change_members(
        &self,
        request: &str,
        target: &Target,
        members: &[String],
    ) -> Result<Value, Failure> {
        let credentials = self.sessions.ensure_session().await?;
        let id = match self.resolve_distribution_list(&credentials, target).await? {
            Lookup::Found(entry) => string_field(&entry, "id", "GetDistributionListRequest")?,
            Lookup::Missing(fault) => return Err(Failure::Fault(fault)),
        };
        self.call(
            &credentials,
            request,
            envelope::distribution_list_members(request, &id, members),
        )
        .await?;
        info!("[upstream] {} on {} for {} member(s)", request, id, members.len());
        Ok(json!({"id": id, "members": members}))
    }
}

fn finish(result: Result<Value, Failure>) -> Outcome {
    match result {
        Ok(payload) => Outcome::from(payload),
        Err(failure) => Outcome::from(failure),
    }
}

#[axum::async_trait]
impl AdminApi for ZimbraClient {
    async fn create_account(&self, account: &NewAccount) -> Outcome {
        finish(self.try_create_account(account).await)
    }

    async fn delete_account(&self, target: &Target) -> Outcome {
        finish(self.try_delete_account(target).await)
    }

    async fn get_account_info(&self, name: &str) -> Outcome {
        finish(self.try_get_account_info(name).await)
    }

    async fn get_messages(&self, name: &str, unread_only: bool) -> Outcome {
        finish(self.try_get_messages(name, unread_only).await)
    }

    async fn get_preauth_link(&self, name: &str) -> Outcome {
        finish(self.try_get_preauth_link(name).await)
    }

    async fn get_distribution_lists(&self) -> Outcome {
        finish(self.try_get_distribution_lists().await)
    }

    async fn create_distribution_list(&self, list: &NewDistributionList) -> Outcome {
        finish(self.try_create_distribution_list(list).await)
    }

    async fn delete_distribution_list(&self, target: &Target) -> Outcome {
        finish(self.try_delete_distribution_list(target).await)
    }

    async fn add_distribution_list_members(&self, target: &Target, members: &[String]) -> Outcome {
        finish(
            self.try_change_members("AddDistributionListMemberRequest", target, members)
                .await,
        )
    }

    async fn remove_distribution_list_members(&self, target: &Target, members: &[String]) -> Outcome {
        finish(
            self.try_change_members("RemoveDistributionListMemberRequest", target, members)
                .await,
        )
    }
}

// ── Response helpers ──────────────────────────────────────────────────────────

/// JSON responses list entities as arrays even when there is exactly one.
fn first<'a>(map: &'a Object, key: &str) -> Option<&'a Object> {
    match map.get(key)? {
        Value::Array(items) => items.first()?.as_object(),
        Value::Object(object) => Some(object),
        _ => None,
    }
}

/// Value of the `{"n": name, "_content": value}` attribute of an entity.
fn attr<'a>(entry: &'a Object, name: &str) -> Option<&'a str> {
    entry
        .get("a")?
        .as_array()?
        .iter()
        .find(|a| a.get("n").and_then(Value::as_str) == Some(name))?
        .get("_content")?
        .as_str()
}

fn string_field(entry: &Object, key: &str, context: &str) -> Result<String, Failure> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Failure::unexpected(context, format!("entry has no {}", key)))
}

fn identity_of(entry: &Object, context: &str) -> Result<(String, String), Failure> {
    Ok((
        string_field(entry, "id", context)?,
        string_field(entry, "name", context)?,
    ))
}

fn identity(response: &Object, element: &str, context: &str) -> Result<(String, String), Failure> {
    let entry = first(response, element)
        .ok_or_else(|| Failure::unexpected(context, format!("no {} entry", element)))?;
    identity_of(entry, context)
}
