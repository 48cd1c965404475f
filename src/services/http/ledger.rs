use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::services::ledger::LedgerRequest;

pub async fn jump(State(state): State<super::AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::RecordTap {
            telegram_id,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(outcome)) => (
            StatusCode::OK,
            Json(json!({"balance": outcome.balance, "earned": outcome.earned})),
        ),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn daily_bonus_status(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::DailyBonusStatus {
            telegram_id,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(can_claim)) => (StatusCode::OK, Json(json!({"canClaim": can_claim}))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn claim_daily_bonus(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ClaimDailyBonus {
            telegram_id,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(outcome)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "balance": outcome.balance,
                "reward": outcome.reward
            })),
        ),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}
