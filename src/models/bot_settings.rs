use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Reward magnitudes resolved from the bot_settings table. Parsed in one
/// place; a missing or unparsable value falls back to the default for that
/// key, never to an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardConfig {
    pub session_reward: Decimal,
    pub referral_reward: Decimal,
    pub daily_bonus_reward: Decimal,
    pub min_withdrawal: Decimal,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            session_reward: Decimal::new(5, 7),
            referral_reward: Decimal::new(5, 5),
            daily_bonus_reward: Decimal::new(1, 5),
            min_withdrawal: Decimal::new(1, 2),
        }
    }
}

impl RewardConfig {
    pub fn from_map(values: &HashMap<String, String>) -> Self {
        let defaults = RewardConfig::default();

        RewardConfig {
            session_reward: parse_or(values.get("sessionReward"), defaults.session_reward),
            referral_reward: parse_or(values.get("referralReward"), defaults.referral_reward),
            daily_bonus_reward: parse_or(
                values.get("dailyBonusReward"),
                defaults.daily_bonus_reward,
            ),
            min_withdrawal: parse_or(values.get("minWithdrawal"), defaults.min_withdrawal),
        }
    }
}

fn parse_or(value: Option<&String>, default: Decimal) -> Decimal {
    value
        .and_then(|v| Decimal::from_str(v).ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_settings_are_absent() {
        let config = RewardConfig::from_map(&HashMap::new());

        assert_eq!(
            config.session_reward,
            Decimal::from_str("0.0000005").unwrap()
        );
        assert_eq!(
            config.referral_reward,
            Decimal::from_str("0.00005").unwrap()
        );
        assert_eq!(
            config.daily_bonus_reward,
            Decimal::from_str("0.00001").unwrap()
        );
        assert_eq!(config.min_withdrawal, Decimal::from_str("0.01").unwrap());
    }

    #[test]
    fn stored_values_override_defaults() {
        let mut values = HashMap::new();
        values.insert("sessionReward".to_string(), "0.000002".to_string());
        values.insert("minWithdrawal".to_string(), "0.5".to_string());

        let config = RewardConfig::from_map(&values);

        assert_eq!(config.session_reward, Decimal::from_str("0.000002").unwrap());
        assert_eq!(config.min_withdrawal, Decimal::from_str("0.5").unwrap());
        assert_eq!(
            config.referral_reward,
            RewardConfig::default().referral_reward
        );
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let mut values = HashMap::new();
        values.insert("dailyBonusReward".to_string(), "not-a-number".to_string());

        let config = RewardConfig::from_map(&values);

        assert_eq!(
            config.daily_bonus_reward,
            RewardConfig::default().daily_bonus_reward
        );
    }
}
