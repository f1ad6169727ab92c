//! Accounts API endpoints

use api_types::account::{
    AccountDeleted, AccountKind as ApiKind, AccountNew, AccountUpdate, AccountView, AccountsQuery,
    TransferNew, TransferView,
};
use axum::{Extension, extract::State};
use engine::{Account, AccountKind, CreateAccountCmd, Money, TransferCmd, UpdateAccountCmd};
use uuid::Uuid;

use crate::{
    ApiResult, ClientId,
    extract::{Json, Path, Query},
    ok, parse_money,
    server::ServerState,
};

fn map_kind(kind: ApiKind) -> AccountKind {
    match kind {
        ApiKind::Bank => AccountKind::Bank,
        ApiKind::Broker => AccountKind::Broker,
        ApiKind::Credit => AccountKind::Credit,
        ApiKind::Cash => AccountKind::Cash,
        ApiKind::Stock => AccountKind::Stock,
    }
}

fn map_kind_back(kind: AccountKind) -> ApiKind {
    match kind {
        AccountKind::Bank => ApiKind::Bank,
        AccountKind::Broker => ApiKind::Broker,
        AccountKind::Credit => ApiKind::Credit,
        AccountKind::Cash => ApiKind::Cash,
        AccountKind::Stock => ApiKind::Stock,
    }
}

fn view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        kind: map_kind_back(account.kind),
        balance: account.balance.to_stored_string(),
        name: account.name,
        currency_id: account.currency_id,
        created_at: account.created_at,
    }
}

pub async fn create(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> ApiResult<AccountView> {
    let balance = match payload.balance.as_deref() {
        Some(balance) => parse_money(balance)?,
        None => Money::ZERO,
    };
    let account = state
        .engine
        .create_account(
            CreateAccountCmd::new(
                client_id,
                payload.name,
                payload.currency_id,
                map_kind(payload.kind),
            )
            .opening_balance(balance),
        )
        .await?;
    ok(view(account))
}

/// All accounts of the caller, or only those of `?kind=`.
pub async fn list(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Query(query): Query<AccountsQuery>,
) -> ApiResult<Vec<AccountView>> {
    let accounts = match query.kind {
        Some(kind) => state.engine.accounts_by_kind(&client_id, map_kind(kind)).await?,
        None => state.engine.accounts(&client_id).await?,
    };
    ok(accounts.into_iter().map(view).collect())
}

pub async fn update(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountUpdate>,
) -> ApiResult<AccountView> {
    let mut cmd = UpdateAccountCmd::new(client_id, payload.id);
    if let Some(balance) = payload.balance.as_deref() {
        cmd = cmd.balance(parse_money(balance)?);
    }
    if let Some(currency_id) = payload.currency_id {
        cmd = cmd.currency(currency_id);
    }
    if let Some(kind) = payload.kind {
        cmd = cmd.kind(map_kind(kind));
    }
    let account = state.engine.update_account(cmd).await?;
    ok(view(account))
}

pub async fn remove(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountDeleted> {
    let removal = state.engine.delete_account(id, &client_id).await?;
    ok(AccountDeleted {
        id: removal.account_id,
        detached_entries: removal.detached_entries,
        removed_payments: removal.removed_payments,
    })
}

pub async fn get(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountView> {
    let account = state.engine.account(id, &client_id).await?;
    ok(view(account))
}

pub async fn transfer(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> ApiResult<TransferView> {
    let amount = parse_money(&payload.amount)?;
    let receipt = state
        .engine
        .transfer(TransferCmd::new(
            client_id,
            payload.source_account_id,
            payload.target_account_id,
            amount,
        ))
        .await?;
    ok(TransferView {
        source_balance: receipt.source.new_balance.to_stored_string(),
        target_balance: receipt.target.new_balance.to_stored_string(),
        entry_ids: receipt.entry_ids.to_vec(),
    })
}
