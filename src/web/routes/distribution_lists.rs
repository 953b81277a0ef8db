use axum::{extract::State, response::Response, Form};
use log::info;

use crate::upstream::{NewDistributionList, Target};
use crate::web::forms::{
    self, CreateDistributionListForm, DistributionListMembersForm, DistributionListTargetForm,
    SignatureOnlyForm,
};
use crate::web::reply::{missing_data, outcome_response};
use crate::web::AppState;

const DEFAULT_SUBSCRIPTION_POLICY: &str = "APPROVAL";
const DEFAULT_UNSUBSCRIPTION_POLICY: &str = "ACCEPT";

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

// ── POST /getDistributionLists ──

pub async fn list(
    State(state): State<AppState>,
    form: Option<Form<SignatureOnlyForm>>,
) -> Response {
    const OP: &str = "getDistributionLists";
    let form = forms::fields(form);

    if let Err(rejected) = state.gate.admit(
        OP,
        &[],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    info!("[web] POST /getDistributionLists");
    outcome_response(OP, state.api.get_distribution_lists().await)
}

// ── POST /createDistributionList ──

pub async fn create(
    State(state): State<AppState>,
    form: Option<Form<CreateDistributionListForm>>,
) -> Response {
    const OP: &str = "createDistributionList";
    let form = forms::fields(form);
    let (Some(name), Some(display_name)) = (form.name, form.display_name) else {
        return missing_data(OP);
    };
    let description = form.description.unwrap_or_default();
    let subscription_policy = form.subscription_policy.unwrap_or_default();
    let unsubscription_policy = form.unsubscription_policy.unwrap_or_default();

    if let Err(rejected) = state.gate.admit(
        OP,
        &[
            name.as_str(),
            display_name.as_str(),
            description.as_str(),
            subscription_policy.as_str(),
            unsubscription_policy.as_str(),
        ],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    info!("[web] POST /createDistributionList name={}", name);
    let list = NewDistributionList {
        name,
        display_name,
        description,
        subscription_policy: or_default(&subscription_policy, DEFAULT_SUBSCRIPTION_POLICY),
        unsubscription_policy: or_default(&unsubscription_policy, DEFAULT_UNSUBSCRIPTION_POLICY),
    };
    outcome_response(OP, state.api.create_distribution_list(&list).await)
}

// ── POST /deleteDistributionList ──

pub async fn delete(
    State(state): State<AppState>,
    form: Option<Form<DistributionListTargetForm>>,
) -> Response {
    const OP: &str = "deleteDistributionList";
    let form = forms::fields(form);
    let list_id = form.distr_list_id.unwrap_or_default();
    let list_name = form.distr_list_name.unwrap_or_default();
    let Some(target) = Target::from_parts(&list_id, &list_name) else {
        return missing_data(OP);
    };

    if let Err(rejected) = state.gate.admit(
        OP,
        &[list_id.as_str(), list_name.as_str()],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(OP, rejected);
    }

    info!("[web] POST /deleteDistributionList target={:?}", target);
    outcome_response(OP, state.api.delete_distribution_list(&target).await)
}

// ── POST /addDistributionListMembers, /removeDistributionListMembers ──

#[derive(Clone, Copy)]
enum MemberChange {
    Add,
    Remove,
}

pub async fn add_members(
    State(state): State<AppState>,
    form: Option<Form<DistributionListMembersForm>>,
) -> Response {
    change_members(state, forms::fields(form), MemberChange::Add).await
}

pub async fn remove_members(
    State(state): State<AppState>,
    form: Option<Form<DistributionListMembersForm>>,
) -> Response {
    change_members(state, forms::fields(form), MemberChange::Remove).await
}

async fn change_members(
    state: AppState,
    form: DistributionListMembersForm,
    change: MemberChange,
) -> Response {
    let op = match change {
        MemberChange::Add => "addDistributionListMembers",
        MemberChange::Remove => "removeDistributionListMembers",
    };
    let list_id = form.distr_list_id.unwrap_or_default();
    let list_name = form.distr_list_name.unwrap_or_default();
    let raw_emails = form.user_emails.unwrap_or_default();
    let members = forms::split_emails(&raw_emails);
    let Some(target) = Target::from_parts(&list_id, &list_name) else {
        return missing_data(op);
    };
    if members.is_empty() {
        return missing_data(op);
    }

    if let Err(rejected) = state.gate.admit(
        op,
        &[list_id.as_str(), list_name.as_str(), raw_emails.as_str()],
        form.timestamp.as_deref(),
        form.hmac_sign.as_deref(),
    ) {
        return outcome_response(op, rejected);
    }

    info!(
        "[web] POST /{} target={:?} members={}",
        op,
        target,
        members.len()
    );
    let outcome = match change {
        MemberChange::Add => state.api.add_distribution_list_members(&target, &members).await,
        MemberChange::Remove => {
            state
                .api
                .remove_distribution_list_members(&target, &members)
                .await
        }
    };
    outcome_response(op, outcome)
}
