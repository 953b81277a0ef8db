pub mod accounts;
pub mod distribution_lists;
pub mod health;
pub mod mailbox;

use super::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/createAccount", post(accounts::create))
        .route("/deleteAccount", post(accounts::delete))
        .route("/getAccountInfo", post(accounts::account_info))
        .route("/getMessages", post(mailbox::messages))
        .route("/getPreauthLink", post(mailbox::preauth_link))
        .route("/getDistributionLists", post(distribution_lists::list))
        .route("/createDistributionList", post(distribution_lists::create))
        .route("/deleteDistributionList", post(distribution_lists::delete))
        .route(
            "/addDistributionListMembers",
            post(distribution_lists::add_members),
        )
        .route(
            "/removeDistributionListMembers",
            post(distribution_lists::remove_members),
        )
        .route("/health", get(health::check))
}
