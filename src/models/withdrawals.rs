use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: i32,
    pub user_id: i32,
    pub amount: Decimal,
    pub wallet_address: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWithdrawal {
    pub amount: Decimal,
    pub wallet_address: String,
}

/// Admin listing row: a withdrawal joined with the requesting user's name.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalWithUser {
    pub id: i32,
    pub user_id: i32,
    pub amount: Decimal,
    pub wallet_address: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn withdrawal_request_accepts_string_amounts() {
        let req: NewWithdrawal =
            serde_json::from_str(r#"{"amount": "0.00005", "walletAddress": "UQabc"}"#).unwrap();
        assert_eq!(req.amount, Decimal::from_str("0.00005").unwrap());
        assert_eq!(req.wallet_address, "UQabc");
    }
}
