use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::users::LoginRequest;
use crate::services::users::UserRequest;

pub async fn login(
    State(state): State<super::AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::Login {
            payload,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match user_rx.await {
        Ok(Ok(outcome)) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(json!(outcome.user)))
        }
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn me(State(state): State<super::AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::GetByTelegramId {
            telegram_id,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (StatusCode::OK, Json(json!(user))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "User not found"})),
        ),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}

pub async fn referrals(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(telegram_id) = super::caller_id(&headers) else {
        return super::unauthorized();
    };

    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::GetReferrals {
            telegram_id,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return super::send_error(e);
    }

    match user_rx.await {
        Ok(Ok(referrals)) => (StatusCode::OK, Json(json!(referrals))),
        Ok(Err(e)) => super::error_response(&e),
        Err(e) => super::recv_error(e),
    }
}
