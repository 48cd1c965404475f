use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::tasks::NewTask;
use crate::services::bot_settings::SettingsRequest;
use crate::services::ledger::{LedgerRequest, WithdrawalDecision};
use crate::services::tasks::TaskRequest;

pub async fn get_settings(State(state): State<super::AppState>) -> impl IntoResponse {
    let (settings_tx, settings_rx) = oneshot::channel();

    let send_result = state
        .settings_channel
        .send(SettingsRequest::GetAll {
            response: settings_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match settings_rx.await {
        Ok(Ok(settings)) => (StatusCode::OK, Json(json!(settings))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn update_settings(
    State(state): State<super::AppState>,
    Json(values): Json<HashMap<String, String>>,
) -> impl IntoResponse {
    let (settings_tx, settings_rx) = oneshot::channel();

    let send_result = state
        .settings_channel
        .send(SettingsRequest::Update {
            values,
            response: settings_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match settings_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({"success": true}))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn list_tasks(State(state): State<super::AppState>) -> impl IntoResponse {
    let (task_tx, task_rx) = oneshot::channel();

    let send_result = state
        .task_channel
        .send(TaskRequest::ListAll { response: task_tx })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match task_rx.await {
        Ok(Ok(tasks)) => (StatusCode::OK, Json(json!(tasks))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn create_task(
    State(state): State<super::AppState>,
    Json(task): Json<NewTask>,
) -> impl IntoResponse {
    let (task_tx, task_rx) = oneshot::channel();

    let send_result = state
        .task_channel
        .send(TaskRequest::Create {
            task,
            response: task_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match task_rx.await {
        Ok(Ok(task)) => (StatusCode::OK, Json(json!(task))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn delete_task(
    State(state): State<super::AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (task_tx, task_rx) = oneshot::channel();

    let send_result = state
        .task_channel
        .send(TaskRequest::Delete {
            task_id: id,
            response: task_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match task_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({"success": true}))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn list_withdrawals(State(state): State<super::AppState>) -> impl IntoResponse {
    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ListAllWithdrawals {
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

pub async fn approve_withdrawal(
    State(state): State<super::AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    resolve_withdrawal(state, id, WithdrawalDecision::Approve).await
}

pub async fn reject_withdrawal(
    State(state): State<super::AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    resolve_withdrawal(state, id, WithdrawalDecision::Reject).await
}

async fn resolve_withdrawal(
    state: super::AppState,
    id: i32,
    decision: WithdrawalDecision,
) -> (StatusCode, Json<serde_json::Value>) {
    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ResolveWithdrawal {
            withdrawal_id: id,
            decision,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(withdrawal)) => (StatusCode::OK, Json(json!(withdrawal))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}
