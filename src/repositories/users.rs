use crate::models::users;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    /// Creates a user. The new user's own referral code is their telegram id,
    /// so invite links can carry it directly. A supplied referral code is
    /// resolved against the referrer's telegram id; an unknown code just
    /// leaves the linkage unset.
    pub async fn insert_user(
        &self,
        telegram_id: &str,
        username: Option<&str>,
        referral_code: Option<&str>,
    ) -> Result<users::User, anyhow::Error> {
        let referrer_id: Option<i32> = match referral_code {
            Some(code) => {
                sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE telegram_id = $1")
                    .bind(code)
                    .fetch_optional(&self.conn)
                    .await?
            }
            None => None,
        };

        let user = sqlx::query_as::<_, users::User>(
            r#"
                INSERT INTO users (telegram_id, username, referral_code, referrer_id)
                VALUES ($1, $2, $1, $3)
                RETURNING *
            "#,
        )
        .bind(telegram_id)
        .bind(username)
        .bind(referrer_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i32) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_telegram_id(
        &self,
        telegram_id: &str,
    ) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>("SELECT * FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_referrals(
        &self,
        referrer_id: i32,
    ) -> Result<Vec<users::User>, anyhow::Error> {
        let referrals = sqlx::query_as::<_, users::User>(
            "SELECT * FROM users WHERE referrer_id = $1 ORDER BY created_at DESC",
        )
        .bind(referrer_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(referrals)
    }

    /// Single atomic increment; balance arithmetic never happens in process.
    pub async fn apply_tap_reward(
        &self,
        user_id: i32,
        amount: Decimal,
        now: NaiveDateTime,
    ) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>(
            "UPDATE users SET balance = balance + $1, last_jump_time = $2 WHERE id = $3 RETURNING *",
        )
        .bind(amount)
        .bind(now)
        .bind(user_id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn credit_balance(
        &self,
        user_id: i32,
        amount: Decimal,
    ) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>(
            "UPDATE users SET balance = balance + $1 WHERE id = $2 RETURNING *",
        )
        .bind(amount)
        .bind(user_id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(user)
    }

    /// Claims the daily bonus iff the last claim is strictly older than the
    /// cutoff (or absent). The credit and the timestamp move in one
    /// conditional update, so concurrent claims cannot double-grant.
    /// Returns None when the cooldown has not elapsed.
    pub async fn claim_daily_bonus(
        &self,
        user_id: i32,
        reward: Decimal,
        now: NaiveDateTime,
        cutoff: NaiveDateTime,
    ) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>(
            r#"
                UPDATE users
                SET balance = balance + $1, last_daily_bonus = $2
                WHERE id = $3 AND (last_daily_bonus IS NULL OR last_daily_bonus < $4)
                RETURNING *
            "#,
        )
        .bind(reward)
        .bind(now)
        .bind(user_id)
        .bind(cutoff)
        .fetch_optional(&self.conn)
        .await?;

        Ok(user)
    }

    /// Flips referral_reward_claimed false -> true and credits the referrer
    /// in one transaction. The conditional flip means exactly one concurrent
    /// caller wins; everyone else gets false and must not credit again.
    pub async fn grant_referral_reward(
        &self,
        referred_id: i32,
        referrer_id: i32,
        amount: Decimal,
    ) -> Result<bool, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let claimed = sqlx::query(
            r#"
                UPDATE users SET referral_reward_claimed = TRUE
                WHERE id = $1 AND referral_reward_claimed = FALSE
            "#,
        )
        .bind(referred_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET balance = balance + $1 WHERE id = $2")
            .bind(amount)
            .bind(referrer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}
