use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::tasks::CompleteTaskRequest;
use crate::services::ledger::LedgerRequest;
use crate::services::tasks::TaskRequest;

pub async fn list_tasks(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (task_tx, task_rx) = oneshot::channel();

    let send_result = state
        .task_channel
        .send(TaskRequest::ListForUser {
            telegram_id,
            response: task_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match task_rx.await {
        Ok(Ok(board)) => (
            StatusCode::OK,
            Json(json!({
                "tasks": board.tasks,
                "completedTasks": board.completed_tasks
            })),
        ),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn complete_task(
    State(state): State<super::AppState>,
    headers: HeaderMap,
    Json(payload): Json<CompleteTaskRequest>,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();

    let send_result = state
        .ledger_channel
        .send(LedgerRequest::CompleteTask {
            telegram_id,
            task_id: payload.task_id,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match ledger_rx.await {
        Ok(Ok(balance)) => (
            StatusCode::OK,
            Json(json!({"success": true, "balance": balance})),
        ),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}
