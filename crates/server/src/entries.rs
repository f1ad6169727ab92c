//! Transactions and expenses API endpoints
//!
//! Both resources share one body shape; the path decides the entry kind.

use api_types::entry::{DeleteQuery, EntryCreated, EntryDeleted, EntryNew, EntryView};
use axum::{Extension, extract::State};
use chrono::Utc;
use engine::{CreateEntryCmd, DeleteEntryCmd, EntryKind, LedgerEntry};
use uuid::Uuid;

use crate::{
    ApiResult, ClientId,
    extract::{Json, Path, Query},
    ok, parse_money,
    server::ServerState,
};

fn view(entry: LedgerEntry) -> EntryView {
    EntryView {
        id: entry.id,
        account_id: entry.account_id,
        name: entry.name,
        amount: entry.amount.to_stored_string(),
        is_income: entry.is_income,
        currency_id: entry.currency_id,
        category: entry.category,
        remarks: entry.remarks,
        executed_at: entry.executed_at,
    }
}

fn command(client_id: String, payload: EntryNew) -> Result<CreateEntryCmd, crate::ServerError> {
    let mut cmd = CreateEntryCmd::new(
        client_id,
        parse_money(&payload.amount)?,
        payload.currency_id,
        payload.category,
        payload.executed_at.with_timezone(&Utc),
    )
    .income(payload.is_income);
    cmd.account_id = payload.account_id;
    cmd.name = payload.name;
    cmd.remarks = payload.remarks;
    Ok(cmd)
}

async fn create(
    state: ServerState,
    kind: EntryKind,
    client_id: String,
    payload: EntryNew,
) -> ApiResult<EntryCreated> {
    let cmd = command(client_id, payload)?;
    let receipt = match kind {
        EntryKind::Transaction => state.engine.create_transaction(cmd).await?,
        EntryKind::Expense => state.engine.create_expense(cmd).await?,
    };
    ok(EntryCreated {
        id: receipt.entry_id,
        new_balance: receipt.new_balance.map(|b| b.to_stored_string()),
    })
}

async fn list(state: ServerState, kind: EntryKind, client_id: String) -> ApiResult<Vec<EntryView>> {
    let entries = state.engine.entries(&client_id, kind).await?;
    ok(entries.into_iter().map(view).collect())
}

async fn remove(
    state: ServerState,
    kind: EntryKind,
    client_id: String,
    id: Uuid,
    query: DeleteQuery,
) -> ApiResult<EntryDeleted> {
    let change = state
        .engine
        .delete_entry(DeleteEntryCmd::new(client_id, id, kind).revert_balance(query.revert_balance))
        .await?;
    ok(EntryDeleted {
        id,
        new_balance: change.map(|c| c.new_balance.to_stored_string()),
    })
}

pub async fn create_transaction(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<EntryNew>,
) -> ApiResult<EntryCreated> {
    create(state, EntryKind::Transaction, client_id, payload).await
}

pub async fn create_expense(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<EntryNew>,
) -> ApiResult<EntryCreated> {
    create(state, EntryKind::Expense, client_id, payload).await
}

pub async fn list_transactions(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<EntryView>> {
    list(state, EntryKind::Transaction, client_id).await
}

pub async fn list_expenses(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<EntryView>> {
    list(state, EntryKind::Expense, client_id).await
}

pub async fn delete_transaction(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<EntryDeleted> {
    remove(state, EntryKind::Transaction, client_id, id, query).await
}

pub async fn delete_expense(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<EntryDeleted> {
    remove(state, EntryKind::Expense, client_id, id, query).await
}
