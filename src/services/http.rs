use axum::{
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::bot_settings::SettingsRequest;
use super::ledger::LedgerRequest;
use super::tasks::TaskRequest;
use super::users::UserRequest;
use super::LedgerError;

mod admin;
mod ledger;
mod tasks;
mod users;
mod withdrawals;

#[derive(Clone)]
struct AppState {
    ledger_channel: mpsc::Sender<LedgerRequest>,
    user_channel: mpsc::Sender<UserRequest>,
    task_channel: mpsc::Sender<TaskRequest>,
    settings_channel: mpsc::Sender<SettingsRequest>,
}

/// Caller identity is the opaque x-telegram-id header; validating it is the
/// Telegram web-app layer's job, not ours.
fn caller_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-telegram-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthorized"})),
    )
}

fn send_error(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": format!("Failed to process request: {}", e)})),
    )
}

fn recv_error(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": format!("Failed to receive response: {}", e)})),
    )
}

fn error_response(error: &LedgerError) -> (StatusCode, Json<Value>) {
    match error {
        LedgerError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": error.to_string()})),
        ),
        LedgerError::InvalidState(_) => (
            StatusCode::CONFLICT,
            Json(json!({"message": error.to_string()})),
        ),
        LedgerError::Storage(e) => {
            log::error!("Storage error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Internal server error"})),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": error.to_string()})),
        ),
    }
}

pub async fn start_http_server(
    listen: &str,
    ledger_channel: mpsc::Sender<LedgerRequest>,
    user_channel: mpsc::Sender<UserRequest>,
    task_channel: mpsc::Sender<TaskRequest>,
    settings_channel: mpsc::Sender<SettingsRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        ledger_channel,
        user_channel,
        task_channel,
        settings_channel,
    };

    let app = Router::new()
        .route("/api/users/login", post(users::login))
        .route("/api/users/me", get(users::me))
        .route("/api/users/jump", post(ledger::jump))
        .route("/api/users/referrals", get(users::referrals))
        .route("/api/daily-bonus/status", get(ledger::daily_bonus_status))
        .route("/api/daily-bonus/claim", post(ledger::claim_daily_bonus))
        .route("/api/tasks", get(tasks::list_tasks))
        .route("/api/tasks/complete", post(tasks::complete_task))
        .route(
            "/api/withdrawals",
            post(withdrawals::create_withdrawal).get(withdrawals::list_withdrawals),
        )
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route(
            "/api/admin/tasks",
            get(admin::list_tasks).post(admin::create_task),
        )
        .route("/api/admin/tasks/{id}", delete(admin::delete_task))
        .route("/api/admin/withdrawals", get(admin::list_withdrawals))
        .route(
            "/api/admin/withdrawals/{id}/approve",
            post(admin::approve_withdrawal),
        )
        .route(
            "/api/admin/withdrawals/{id}/reject",
            post(admin::reject_withdrawal),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        assert_eq!(
            error_response(&LedgerError::NotFound("User")).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(&LedgerError::AlreadyClaimed).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&LedgerError::AlreadyCompleted).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&LedgerError::InsufficientBalance).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&LedgerError::InvalidState("rejected".to_string())).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(&LedgerError::Storage(anyhow::anyhow!("boom"))).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn caller_id_requires_a_non_empty_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_id(&headers), None);

        headers.insert("x-telegram-id", "".parse().unwrap());
        assert_eq!(caller_id(&headers), None);

        headers.insert("x-telegram-id", "12345".parse().unwrap());
        assert_eq!(caller_id(&headers), Some("12345".to_string()));
    }
}
