use axum::{extract::State, response::Response, Form};
use log::info;

use crate::upstream::{NewAccount, Target};
use crate::web::forms::{self, AccountNameForm, AccountTargetForm, CreateAccountForm};
use crate::web::reply::{missing_data, outcome_response};
use crate::web::AppState;

// ── POST /createAccount ──

pub async fn create(
    State(state): State<AppState>,
    form: Option<Form<CreateAccountForm>>,
) -> Response {
    const OP: &str = "createAccount";
    let form = forms::fields(form);
    let (Some(account_name), Some(password), Some(name), Some(surname), Some(patronymic)) = (
        form.account_name,
        form.password,
        form.name,
        form.surname,
        form.patronymic,
    ) else {
        return missing_data(OP);
    };

    let signed = [
        account_name.as_str(),
        password.as_str(),
        name.as_str(),
        surname.as_str(),
        patronymic.as_str(),
    ];
    if let Err(rejected) = state.gate.admit(
        OP,
        &signed,
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    info!("[web] POST /createAccount accountName={}", account_name);
    let account = NewAccount {
        name: account_name,
        password,
        given_name: name,
        middle_name: patronymic,
        surname,
    };
    outcome_response(OP, state.api.create_account(&account).await)
}

// ── POST /deleteAccount ──

pub async fn delete(
    State(state): State<AppState>,
    form: Option<Form<AccountTargetForm>>,
) -> Response {
    const OP: &str = "deleteAccount";
    let form = forms::fields(form);
    let account_id = form.account_id.unwrap_or_default();
    let account_name = form.account_name.unwrap_or_default();
    let Some(target) = Target::from_parts(&account_id, &account_name) else {
        return missing_data(OP);
    };

    if let Err(rejected) = state.gate.admit(
        OP,
        &[account_id.as_str(), account_name.as_str()],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    info!("[web] POST /deleteAccount target={:?}", target);
    outcome_response(OP, state.api.delete_account(&target).await)
}

// ── POST /getAccountInfo ──

pub async fn account_info(
    State(state): State<AppState>,
    form: Option<Form<AccountNameForm>>,
) -> Response {
    const OP: &str = "getAccountInfo";
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

    info!("[web] POST /getAccountInfo accountName={}", account_name);
    outcome_response(OP, state.api.get_account_info(&account_name).await)
}
