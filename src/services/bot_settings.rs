use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{LedgerError, RequestHandler, Service};
use crate::repositories::bot_settings::SettingsRepository;

pub enum SettingsRequest {
    GetAll {
        response: oneshot::Sender<Result<HashMap<String, String>, LedgerError>>,
    },
    Update {
        values: HashMap<String, String>,
        response: oneshot::Sender<Result<(), LedgerError>>,
    },
}

#[derive(Clone)]
pub struct SettingsRequestHandler {
    repository: SettingsRepository,
}

impl SettingsRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = SettingsRepository::new(sql_conn);

        SettingsRequestHandler { repository }
    }
}

#[async_trait]
impl RequestHandler<SettingsRequest> for SettingsRequestHandler {
    async fn handle_request(&self, request: SettingsRequest) {
        match request {
            SettingsRequest::GetAll { response } => {
                let result = self
                    .repository
                    .get_settings()
                    .await
                    .map_err(LedgerError::Storage);
                let _ = response.send(result);
            }
            SettingsRequest::Update { values, response } => {
                let result = self
                    .repository
                    .update_settings(&values)
                    .await
                    .map_err(LedgerError::Storage);
                let _ = response.send(result);
            }
        }
    }
}

pub struct SettingsService;

impl SettingsService {
    pub fn new() -> Self {
        SettingsService {}
    }
}

#[async_trait]
impl Service<SettingsRequest, SettingsRequestHandler> for SettingsService {}
