use axum::{extract::State, response::Response, Form};
use log::info;

use crate::web::forms::{self, AccountNameForm, MessagesForm};
use crate::web::reply::{missing_data, outcome_response};
use crate::web::AppState;

// ── POST /getMessages ──

pub async fn messages(
    State(state): State<AppState>,
    form: Option<Form<MessagesForm>>,
) -> Response {
    const OP: &str = "getMessages";
    let form = forms::fields(form);
    let Some(account_name) = form.account_name else {
        return missing_data(OP);
    };
    let unread_raw = form.unread_only.unwrap_or_default();

    if let Err(rejected) = state.gate.admit(
        OP,
        &[account_name.as_str(), unread_raw.as_str()],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    let unread_only = forms::unread_only(&unread_raw);
    info!(
        "[web] POST /getMessages accountName={} unreadOnly={}",
        account_name, unread_only
    );
    outcome_response(OP, state.api.get_messages(&account_name, unread_only).await)
}

// ── POST /getPreauthLink ──

pub async fn preauth_link(
    State(state): State<AppState>,
    form: Option<Form<AccountNameForm>>,
) -> Response {
    const OP: &str = "getPreauthLink";
    let form = forms::fields(form);
    let Some(account_name) = form.account_name else {
        return missing_data(OP);
    };

    if let Err(rejected) = state.gate.admit(
        OP,
        &[account_name.as_str()],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    info!("[web] POST /getPreauthLink accountName={}", account_name);
    outcome_response(OP, state.api.get_preauth_link(&account_name).await)
}
