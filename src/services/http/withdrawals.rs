use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::withdrawals::NewWithdrawal;
use crate::services::ledger::LedgerRequest;

pub async fn create_withdrawal(
    State(state): State<super::AppState>,
    headers: HeaderMap,
    Json(request): Json<NewWithdrawal>,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::RequestWithdrawal {
            telegram_id,
            request,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(withdrawal)) => (StatusCode::CREATED, Json(json!(withdrawal))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn list_withdrawals(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ListWithdrawals {
            telegram_id,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(withdrawals)) => (StatusCode::OK, Json(json!(withdrawals))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}
