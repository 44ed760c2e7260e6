//! Read-only views over the prospects and proposals the quote bridge creates.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tidyquote_core::crm::ClientCollaborator;
use tidyquote_core::domain::client::{Client, ClientId};
use tidyquote_core::domain::proposal::{Proposal, ProposalId};

use crate::api::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/clients/{id}", get(get_client))
        .route("/clients/{id}/proposals", get(client_proposals))
        .route("/proposals/{id}", get(get_proposal))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientListQuery {
    email: Option<String>,
}

async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> ApiResult<Json<Vec<Client>>> {
    let clients = match query.email.as_deref() {
        Some(email) => state.clients.find_by_email(email)?.into_iter().collect(),
        None => state.clients.get_all()?,
    };
    Ok(Json(clients))
}

async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.clients.get_by_id(id.parse::<ClientId>()?)?))
}

async fn client_proposals(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Proposal>>> {
    let client = state.clients.get_by_id(id.parse::<ClientId>()?)?;
    Ok(Json(state.proposals.list_for_client(client.id)?))
}

async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Proposal>> {
    Ok(Json(state.proposals.get_by_id(id.parse::<ProposalId>()?)?))
}
