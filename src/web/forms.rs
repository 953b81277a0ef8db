use axum::Form;
use serde::Deserialize;

/// Every field is optional at the parsing stage so absence can be reported
/// as `MISSING_DATA` instead of a framework rejection. A body that is not a
/// form at all reads as an empty form.
pub fn fields<T: Default>(form: Option<Form<T>>) -> T {
    form.map(|Form(f)| f).unwrap_or_default()
}

#[derive(Deserialize, Default)]
pub struct CreateAccountForm {
    #[serde(rename = "accountName")]
    pub account_name: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct AccountTargetForm {
    #[serde(rename = "accountID")]
    pub account_id: Option<String>,
    #[serde(rename = "accountName")]
    pub account_name: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct AccountNameForm {
    #[serde(rename = "accountName")]
    pub account_name: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct MessagesForm {
    #[serde(rename = "accountName")]
    pub account_name: Option<String>,
    #[serde(rename = "unreadOnly")]
    pub unread_only: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SignatureOnlyForm {
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CreateDistributionListForm {
    pub name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "subscriptionPolicy")]
    pub subscription_policy: Option<String>,
    #[serde(rename = "unsubscriptionPolicy")]
    pub unsubscription_policy: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct DistributionListTargetForm {
    #[serde(rename = "distrListID")]
    pub distr_list_id: Option<String>,
    #[serde(rename = "distrListName")]
    pub distr_list_name: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct DistributionListMembersForm {
    #[serde(rename = "distrListID")]
    pub distr_list_id: Option<String>,
    #[serde(rename = "distrListName")]
    pub distr_list_name: Option<String>,
    #[serde(rename = "userEmails")]
    pub user_emails: Option<String>,
    pub timestamp: Option<String>,
    pub hmac_sign: Option<String>,
}

/// `userEmails` is a comma separated list; blanks are dropped.
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Only an explicit `false` or `0` turns the unread filter off.
pub fn unread_only(raw: &str) -> bool {
    !(raw.eq_ignore_ascii_case("false") || raw == "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_emails_trims_and_drops_blanks() {
        assert_eq!(
            split_emails(" a@example.com, b@example.com ,,"),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert!(split_emails(" , ").is_empty());
    }

    #[test]
    fn unread_only_defaults_to_true() {
        assert!(unread_only(""));
        assert!(unread_only("true"));
        assert!(unread_only("yes"));
        assert!(!unread_only("false"));
        assert!(!unread_only("FALSE"));
        assert!(!unread_only("0"));
    }

    #[test]
    fn absent_form_reads_as_empty() {
        let form: CreateAccountForm = fields(None);
        assert!(form.account_name.is_none());
        assert!(form.hmac_sign.is_none());
    }
}
