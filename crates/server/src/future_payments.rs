//! Future payments API endpoints

use api_types::future_payment::{
    FrequencyView, FuturePaymentNew, FuturePaymentUpdate, FuturePaymentView,
};
use axum::{Extension, extract::State};
use chrono::Utc;
use engine::{
    CreateFuturePaymentCmd, Frequency, FuturePayment, UpdateFuturePaymentCmd,
};
use uuid::Uuid;

use crate::{
    ApiResult, ClientId, ServerError,
    extract::{Json, Path},
    ok, parse_money,
    server::ServerState,
};

fn frequency_view(frequency: Frequency) -> FrequencyView {
    let breakdown = frequency.describe();
    FrequencyView {
        seconds: frequency.as_secs(),
        days: breakdown.days,
        months: breakdown.months,
        years: breakdown.years,
    }
}

fn view(payment: FuturePayment) -> FuturePaymentView {
    FuturePaymentView {
        id: payment.id,
        account_id: payment.account_id,
        name: payment.name,
        amount: payment.amount.to_stored_string(),
        is_income: payment.is_income,
        is_rolling: payment.is_rolling,
        frequency: payment.frequency.map(frequency_view),
        currency_id: payment.currency_id,
        scheduled_at: payment.scheduled_at,
        remarks: payment.remarks,
    }
}

fn command(client_id: String, payload: FuturePaymentNew) -> Result<CreateFuturePaymentCmd, ServerError> {
    let mut cmd = CreateFuturePaymentCmd::new(
        client_id,
        payload.account_id,
        payload.name,
        parse_money(&payload.amount)?,
        payload.currency_id,
        payload.scheduled_at.with_timezone(&Utc),
    )
    .income(payload.is_income);
    cmd.is_rolling = payload.is_rolling;
    cmd.frequency = payload
        .frequency
        .map(Frequency::from_secs)
        .transpose()?;
    cmd.remarks = payload.remarks;
    Ok(cmd)
}

pub async fn create(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<FuturePaymentNew>,
) -> ApiResult<FuturePaymentView> {
    let payment = state
        .engine
        .create_future_payment(command(client_id, payload)?)
        .await?;
    ok(view(payment))
}

pub async fn list(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<FuturePaymentView>> {
    let payments = state.engine.future_payments(&client_id).await?;
    ok(payments.into_iter().map(view).collect())
}

pub async fn update(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Json(payload): Json<FuturePaymentUpdate>,
) -> ApiResult<FuturePaymentView> {
    let fields = command(client_id, payload.payment)?;
    let payment = state
        .engine
        .update_future_payment(UpdateFuturePaymentCmd::new(payload.id, fields))
        .await?;
    ok(view(payment))
}

pub async fn remove(
    Extension(ClientId(client_id)): Extension<ClientId>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    state.engine.delete_future_payment(id, &client_id).await?;
    ok(id)
}
