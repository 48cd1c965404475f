use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{LedgerError, RequestHandler, Service};
use crate::models::users::User;
use crate::models::withdrawals::{NewWithdrawal, Withdrawal, WithdrawalWithUser};
use crate::repositories::bot_settings::SettingsRepository;
use crate::repositories::tasks::TaskRepository;
use crate::repositories::users::UserRepository;
use crate::repositories::withdrawals::WithdrawalRepository;

pub enum WithdrawalDecision {
    Approve,
    Reject,
}

pub struct TapOutcome {
    pub balance: Decimal,
    pub earned: Decimal,
}

pub struct BonusOutcome {
    pub balance: Decimal,
    pub reward: Decimal,
}

pub enum LedgerRequest {
    RecordTap {
        telegram_id: String,
        response: oneshot::Sender<Result<TapOutcome, LedgerError>>,
    },
    DailyBonusStatus {
        telegram_id: String,
        response: oneshot::Sender<Result<bool, LedgerError>>,
    },
    ClaimDailyBonus {
        telegram_id: String,
        response: oneshot::Sender<Result<BonusOutcome, LedgerError>>,
    },
    CompleteTask {
        telegram_id: String,
        task_id: i32,
        response: oneshot::Sender<Result<Decimal, LedgerError>>,
    },
    RequestWithdrawal {
        telegram_id: String,
        request: NewWithdrawal,
        response: oneshot::Sender<Result<Withdrawal, LedgerError>>,
    },
    ResolveWithdrawal {
        withdrawal_id: i32,
        decision: WithdrawalDecision,
        response: oneshot::Sender<Result<Withdrawal, LedgerError>>,
    },
    ListWithdrawals {
        telegram_id: String,
        response: oneshot::Sender<Result<Vec<Withdrawal>, LedgerError>>,
    },
    ListAllWithdrawals {
        response: oneshot::Sender<Result<Vec<WithdrawalWithUser>, LedgerError>>,
    },
}

/// The referral reward unlocks once the referred user has existed for an
/// hour, and is handed out lazily on their next tap. No background sweep:
/// a referred user who never taps again never triggers the grant.
fn referral_reward_due(user: &User, now: NaiveDateTime) -> bool {
    user.referrer_id.is_some()
        && !user.referral_reward_claimed
        && now - user.created_at >= Duration::hours(1)
}

/// Strictly more than 24 hours must have elapsed since the last claim.
fn daily_bonus_available(last_daily_bonus: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    match last_daily_bonus {
        None => true,
        Some(last) => now - last > Duration::hours(24),
    }
}

#[derive(Clone)]
pub struct LedgerRequestHandler {
    users: UserRepository,
    tasks: TaskRepository,
    withdrawals: WithdrawalRepository,
    settings: SettingsRepository,
}

impl LedgerRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        LedgerRequestHandler {
            users: UserRepository::new(sql_conn.clone()),
            tasks: TaskRepository::new(sql_conn.clone()),
            withdrawals: WithdrawalRepository::new(sql_conn.clone()),
            settings: SettingsRepository::new(sql_conn),
        }
    }

    async fn record_tap(&self, telegram_id: &str) -> Result<TapOutcome, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        let config = self.settings.reward_config().await?;
        let now = Utc::now().naive_utc();

        let user = self
            .users
            .apply_tap_reward(user.id, config.session_reward, now)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        if referral_reward_due(&user, now) {
            if let Some(referrer_id) = user.referrer_id {
                let granted = self
                    .users
                    .grant_referral_reward(user.id, referrer_id, config.referral_reward)
                    .await?;

                if granted {
                    log::info!(
                        "Granted referral reward {} TON to referrer {} for user {}",
                        config.referral_reward,
                        referrer_id,
                        user.telegram_id
                    );
                }
            }
        }

        Ok(TapOutcome {
            balance: user.balance,
            earned: config.session_reward,
        })
    }

    async fn daily_bonus_status(&self, telegram_id: &str) -> Result<bool, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        Ok(daily_bonus_available(
            user.last_daily_bonus,
            Utc::now().naive_utc(),
        ))
    }

    async fn claim_daily_bonus(&self, telegram_id: &str) -> Result<BonusOutcome, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        let config = self.settings.reward_config().await?;
        let now = Utc::now().naive_utc();
        let cutoff = now - Duration::hours(24);

        let user = self
            .users
            .claim_daily_bonus(user.id, config.daily_bonus_reward, now, cutoff)
            .await?
            .ok_or(LedgerError::AlreadyClaimed)?;

        Ok(BonusOutcome {
            balance: user.balance,
            reward: config.daily_bonus_reward,
        })
    }

    async fn complete_task(&self, telegram_id: &str, task_id: i32) -> Result<Decimal, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        let task = self
            .tasks
            .get_task(task_id)
            .await?
            .ok_or(LedgerError::NotFound("Task"))?;

        let balance = self
            .tasks
            .complete_task_once(user.id, task.id, task.reward)
            .await?
            .ok_or(LedgerError::AlreadyCompleted)?;

        Ok(balance)
    }

    async fn request_withdrawal(
        &self,
        telegram_id: &str,
        request: &NewWithdrawal,
    ) -> Result<Withdrawal, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        let config = self.settings.reward_config().await?;

        if request.amount < config.min_withdrawal {
            return Err(LedgerError::BelowMinimum(config.min_withdrawal));
        }

        let withdrawal = self
            .withdrawals
            .create_pending(user.id, request.amount, &request.wallet_address)
            .await?
            .ok_or(LedgerError::InsufficientBalance)?;

        log::info!(
            "User {} requested withdrawal of {} TON to {}",
            user.telegram_id,
            withdrawal.amount,
            withdrawal.wallet_address
        );

        Ok(withdrawal)
    }

    /// Resolving a withdrawal that is no longer pending is a hard error, not
    /// a no-op, so a repeated admin action surfaces instead of silently
    /// re-running (the refund in particular must happen exactly once).
    async fn resolve_withdrawal(
        &self,
        withdrawal_id: i32,
        decision: &WithdrawalDecision,
    ) -> Result<Withdrawal, LedgerError> {
        let (status, refund) = match decision {
            WithdrawalDecision::Approve => ("completed", false),
            WithdrawalDecision::Reject => ("rejected", true),
        };

        let resolved = self
            .withdrawals
            .resolve_pending(withdrawal_id, status, refund)
            .await?;

        match resolved {
            Some(withdrawal) => Ok(withdrawal),
            None => match self.withdrawals.get_withdrawal(withdrawal_id).await? {
                Some(existing) => Err(LedgerError::InvalidState(existing.status)),
                None => Err(LedgerError::NotFound("Withdrawal")),
            },
        }
    }

    async fn list_withdrawals(&self, telegram_id: &str) -> Result<Vec<Withdrawal>, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        Ok(self.withdrawals.get_withdrawals(user.id).await?)
    }

    async fn list_all_withdrawals(&self) -> Result<Vec<WithdrawalWithUser>, LedgerError> {
        Ok(self.withdrawals.get_all_withdrawals().await?)
    }
}

#[async_trait]
impl RequestHandler<LedgerRequest> for LedgerRequestHandler {
    async fn handle_request(&self, request: LedgerRequest) {
        match request {
            LedgerRequest::RecordTap {
                telegram_id,
                response,
            } => {
                let result = self.record_tap(&telegram_id).await;
                let _ = response.send(result);
            }
            LedgerRequest::DailyBonusStatus {
                telegram_id,
                response,
            } => {
                let result = self.daily_bonus_status(&telegram_id).await;
                let _ = response.send(result);
            }
            LedgerRequest::ClaimDailyBonus {
                telegram_id,
                response,
            } => {
                let result = self.claim_daily_bonus(&telegram_id).await;
                let _ = response.send(result);
            }
            LedgerRequest::CompleteTask {
                telegram_id,
                task_id,
                response,
            } => {
                let result = self.complete_task(&telegram_id, task_id).await;
                let _ = response.send(result);
            }
            LedgerRequest::RequestWithdrawal {
                telegram_id,
                request,
                response,
            } => {
                let result = self.request_withdrawal(&telegram_id, &request).await;
                let _ = response.send(result);
            }
            LedgerRequest::ResolveWithdrawal {
                withdrawal_id,
                decision,
                response,
            } => {
                let result = self.resolve_withdrawal(withdrawal_id, &decision).await;
                let _ = response.send(result);
            }
            LedgerRequest::ListWithdrawals {
                telegram_id,
                response,
            } => {
                let result = self.list_withdrawals(&telegram_id).await;
                let _ = response.send(result);
            }
            LedgerRequest::ListAllWithdrawals { response } => {
                let result = self.list_all_withdrawals().await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        LedgerService {}
    }
}

#[async_trait]
impl Service<LedgerRequest, LedgerRequestHandler> for LedgerService {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn referred_user(created_at: NaiveDateTime, claimed: bool) -> User {
        User {
            id: 2,
            telegram_id: "222".to_string(),
            username: Some("frog".to_string()),
            balance: Decimal::ZERO,
            level: 1,
            referral_code: "222".to_string(),
            referrer_id: Some(1),
            referral_reward_claimed: claimed,
            last_jump_time: None,
            last_daily_bonus: None,
            created_at,
        }
    }

    #[test]
    fn referral_not_due_before_one_hour() {
        let user = referred_user(at(12, 0, 0), false);

        assert!(!referral_reward_due(&user, at(12, 30, 0)));
        assert!(!referral_reward_due(&user, at(12, 59, 59)));
    }

    #[test]
    fn referral_due_from_one_hour_on() {
        let user = referred_user(at(12, 0, 0), false);

        assert!(referral_reward_due(&user, at(13, 0, 0)));
        assert!(referral_reward_due(&user, at(13, 30, 0)));
    }

    #[test]
    fn referral_never_due_once_claimed() {
        let user = referred_user(at(12, 0, 0), true);

        assert!(!referral_reward_due(&user, at(14, 0, 0)));
    }

    #[test]
    fn referral_never_due_without_referrer() {
        let mut user = referred_user(at(12, 0, 0), false);
        user.referrer_id = None;

        assert!(!referral_reward_due(&user, at(14, 0, 0)));
    }

    #[test]
    fn daily_bonus_available_without_prior_claim() {
        assert!(daily_bonus_available(None, at(12, 0, 0)));
    }

    #[test]
    fn daily_bonus_cooldown_is_strictly_greater_than_24h() {
        let last = at(12, 0, 0);
        let exactly_24h = last + Duration::milliseconds(86_400_000);
        let just_after = last + Duration::milliseconds(86_400_001);

        assert!(!daily_bonus_available(Some(last), exactly_24h));
        assert!(daily_bonus_available(Some(last), just_after));
    }

    #[test]
    fn daily_bonus_unavailable_within_24h() {
        let last = at(12, 0, 0);

        assert!(!daily_bonus_available(Some(last), last + Duration::hours(23)));
    }
}
