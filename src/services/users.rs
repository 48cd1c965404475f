use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{LedgerError, RequestHandler, Service};
use crate::models::users::{LoginRequest, User};
use crate::repositories::users::UserRepository;

pub struct LoginOutcome {
    pub user: User,
    pub created: bool,
}

pub enum UserRequest {
    Login {
        payload: LoginRequest,
        response: oneshot::Sender<Result<LoginOutcome, LedgerError>>,
    },
    GetByTelegramId {
        telegram_id: String,
        response: oneshot::Sender<Result<Option<User>, LedgerError>>,
    },
    GetReferrals {
        telegram_id: String,
        response: oneshot::Sender<Result<Vec<User>, LedgerError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: UserRepository,
}

impl UserRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = UserRepository::new(sql_conn);

        UserRequestHandler { repository }
    }

    /// Find-or-create on first login. Referral linkage is recorded at
    /// creation time only; the reward itself is granted later, on the
    /// referred user's taps.
    async fn login(&self, payload: &LoginRequest) -> Result<LoginOutcome, LedgerError> {
        if let Some(user) = self
            .repository
            .get_user_by_telegram_id(&payload.telegram_id)
            .await?
        {
            return Ok(LoginOutcome {
                user,
                created: false,
            });
        }

        let fallback_name = format!("user_{}", payload.telegram_id);
        let username = payload.username.as_deref().unwrap_or(&fallback_name);

        let user = self
            .repository
            .insert_user(
                &payload.telegram_id,
                Some(username),
                payload.referral_code.as_deref(),
            )
            .await?;

        log::info!(
            "Created user {} (referrer: {:?})",
            user.telegram_id,
            user.referrer_id
        );

        Ok(LoginOutcome {
            user,
            created: true,
        })
    }

    async fn get_by_telegram_id(&self, telegram_id: &str) -> Result<Option<User>, LedgerError> {
        Ok(self.repository.get_user_by_telegram_id(telegram_id).await?)
    }

    async fn get_referrals(&self, telegram_id: &str) -> Result<Vec<User>, LedgerError> {
        let user = self
            .repository
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        Ok(self.repository.get_referrals(user.id).await?)
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::Login { payload, response } => {
                let result = self.login(&payload).await;
                let _ = response.send(result);
            }
            UserRequest::GetByTelegramId {
                telegram_id,
                response,
            } => {
                let result = self.get_by_telegram_id(&telegram_id).await;
                let _ = response.send(result);
            }
            UserRequest::GetReferrals {
                telegram_id,
                response,
            } => {
                let result = self.get_referrals(&telegram_id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}
