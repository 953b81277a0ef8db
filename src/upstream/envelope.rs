//! SOAP 1.2 envelopes for the groupware admin service.
//!
//! Every request asks for the JSON response format so replies and faults can
//! be read with `serde_json`.

const SOAP_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

// ── XML helpers ───────────────────────────────────────────────────────────────

/// Escape characters that are special in XML content / attribute values.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Like [`xml_escape`], but also writes every non-ASCII character as a numeric
/// character reference. Used for personal names, which the admin service
/// stores verbatim.
pub fn xml_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in xml_escape(s).chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", c as u32));
        }
    }
    out
}

fn attr(name: &str, value: &str) -> String {
    format!("<a n=\"{}\">{}</a>", name, value)
}

// ── Envelopes ─────────────────────────────────────────────────────────────────

fn envelope(context: &str, body: &str) -> String {
    format!(
        "<soap:Envelope xmlns:soap=\"{ns}\">\
         <soap:Header><context xmlns=\"urn:zimbra\">{context}</context></soap:Header>\
         <soap:Body>{body}</soap:Body>\
         </soap:Envelope>",
        ns = SOAP_NS,
        context = context,
        body = body,
    )
}

/// Credential exchange. The service answers with the auth token cookie and,
/// because of `csrfTokenSecured`, the anti-forgery header.
pub fn auth_request(principal: &str, secret: &str) -> String {
    envelope(
        "<authTokenControl voidOnExpired=\"1\"/><format type=\"js\"/>",
        &format!(
            "<AuthRequest xmlns=\"urn:zimbraAdmin\">\
             <name>{}</name><password>{}</password>\
             <csrfTokenSecured>1</csrfTokenSecured>\
             </AuthRequest>",
            xml_escape(principal),
            xml_escape(secret),
        ),
    )
}

/// Wraps an admin request body with the session's anti-forgery token.
pub fn admin_request(csrf_token: &str, body: &str) -> String {
    envelope(
        &format!(
            "<format type=\"js\"/><csrfToken>{}</csrfToken>",
            xml_escape(csrf_token)
        ),
        body,
    )
}

// ── Request bodies ────────────────────────────────────────────────────────────

pub struct NewAccountXml<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub given_name: &'a str,
    pub middle_name: &'a str,
    pub surname: &'a str,
}

pub fn create_account(account: &NewAccountXml<'_>) -> String {
    let given = xml_ascii(account.given_name);
    let middle = xml_ascii(account.middle_name);
    let surname = xml_ascii(account.surname);
    let display = format!("{} {} {}", surname, given, middle);
    format!(
        "<CreateAccountRequest xmlns=\"urn:zimbraAdmin\">\
         <name>{}</name><password>{}</password>{}{}{}{}{}{}\
         </CreateAccountRequest>",
        xml_escape(account.name),
        xml_escape(account.password),
        attr("zimbraAccountStatus", "active"),
        attr("displayName", display.trim()),
        attr("givenName", &given),
        attr("initials", &middle),
        attr("sn", &surname),
        attr("zimbraPasswordMustChange", "FALSE"),
    )
}

pub fn get_account_by_name(name: &str) -> String {
    format!(
        "<GetAccountRequest xmlns=\"urn:zimbraAdmin\" applyCos=\"0\">\
         <account by=\"name\">{}</account>\
         </GetAccountRequest>",
        xml_escape(name)
    )
}

pub fn delete_account(id: &str) -> String {
    format!(
        "<DeleteAccountRequest xmlns=\"urn:zimbraAdmin\"><id>{}</id></DeleteAccountRequest>",
        xml_escape(id)
    )
}

pub fn get_domain_preauth_key(domain: &str) -> String {
    format!(
        "<GetDomainRequest xmlns=\"urn:zimbraAdmin\" applyConfig=\"0\" attrs=\"zimbraPreAuthKey\">\
         <domain by=\"name\">{}</domain>\
         </GetDomainRequest>",
        xml_escape(domain)
    )
}

pub fn get_all_distribution_lists() -> String {
    "<GetAllDistributionListsRequest xmlns=\"urn:zimbraAdmin\"/>".to_string()
}

pub struct NewDistributionListXml<'a> {
    pub name: &'a str,
    pub display_name: &'a str,
    pub description: &'a str,
    pub subscription_policy: &'a str,
    pub unsubscription_policy: &'a str,
}

pub fn create_distribution_list(list: &NewDistributionListXml<'_>) -> String {
    let mut attrs = attr("displayName", &xml_ascii(list.display_name));
    if !list.description.is_empty() {
        attrs.push_str(&attr("description", &xml_ascii(list.description)));
    }
    attrs.push_str(&attr(
        "zimbraDistributionListSubscriptionPolicy",
        &xml_escape(list.subscription_policy),
    ));
    attrs.push_str(&attr(
        "zimbraDistributionListUnsubscriptionPolicy",
        &xml_escape(list.unsubscription_policy),
    ));
    format!(
        "<CreateDistributionListRequest xmlns=\"urn:zimbraAdmin\">\
         <name>{}</name>{}\
         </CreateDistributionListRequest>",
        xml_escape(list.name),
        attrs
    )
}

pub fn get_distribution_list_by_name(name: &str) -> String {
    format!(
        "<GetDistributionListRequest xmlns=\"urn:zimbraAdmin\" limit=\"1\">\
         <dl by=\"name\">{}</dl>\
         </GetDistributionListRequest>",
        xml_escape(name)
    )
}

pub fn delete_distribution_list(id: &str) -> String {
    format!(
        "<DeleteDistributionListRequest xmlns=\"urn:zimbraAdmin\"><id>{}</id></DeleteDistributionListRequest>",
        xml_escape(id)
    )
}

/// `AddDistributionListMemberRequest` or `RemoveDistributionListMemberRequest`.
pub fn distribution_list_members(request: &str, id: &str, members: &[String]) -> String {
    let dlm: String = members
        .iter()
        .map(|m| format!("<dlm>{}</dlm>", xml_escape(m)))
        .collect();
    format!(
        "<{req} xmlns=\"urn:zimbraAdmin\"><id>{id}</id>{dlm}</{req}>",
        req = request,
        id = xml_escape(id),
        dlm = dlm,
    )
}
