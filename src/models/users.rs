use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub telegram_id: String,
    pub username: Option<String>,
    pub balance: Decimal,
    pub level: i32,
    pub referral_code: String,
    pub referrer_id: Option<i32>,
    pub referral_reward_claimed: bool,
    pub last_jump_time: Option<chrono::NaiveDateTime>,
    pub last_daily_bonus: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub telegram_id: String,
    pub username: Option<String>,
    pub referral_code: Option<String>,
}
