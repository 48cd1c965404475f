use crate::models::withdrawals;

use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Clone)]
pub struct WithdrawalRepository {
    conn: PgPool,
}

impl WithdrawalRepository {
    pub fn new(conn: PgPool) -> Self {
        WithdrawalRepository { conn }
    }

    /// Escrow at request time: the amount leaves the balance the moment the
    /// withdrawal row is created. The debit only applies while
    /// balance >= amount; zero rows affected means insufficient funds and
    /// nothing is written. Both statements share one transaction.
    pub async fn create_pending(
        &self,
        user_id: i32,
        amount: Decimal,
        wallet_address: &str,
    ) -> Result<Option<withdrawals::Withdrawal>, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let debited = sqlx::query(
            "UPDATE users SET balance = balance - $1 WHERE id = $2 AND balance >= $1",
        )
        .bind(amount)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if debited == 0 {
            return Ok(None);
        }

        let withdrawal = sqlx::query_as::<_, withdrawals::Withdrawal>(
            r#"
                INSERT INTO withdrawals (user_id, amount, wallet_address, status)
                VALUES ($1, $2, $3, 'pending')
                RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(wallet_address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(withdrawal))
    }

    pub async fn get_withdrawal(
        &self,
        id: i32,
    ) -> Result<Option<withdrawals::Withdrawal>, anyhow::Error> {
        let withdrawal =
            sqlx::query_as::<_, withdrawals::Withdrawal>("SELECT * FROM withdrawals WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(withdrawal)
    }

    pub async fn get_withdrawals(
        &self,
        user_id: i32,
    ) -> Result<Vec<withdrawals::Withdrawal>, anyhow::Error> {
        let withdrawals = sqlx::query_as::<_, withdrawals::Withdrawal>(
            "SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(withdrawals)
    }

    pub async fn get_all_withdrawals(
        &self,
    ) -> Result<Vec<withdrawals::WithdrawalWithUser>, anyhow::Error> {
        let withdrawals = sqlx::query_as::<_, withdrawals::WithdrawalWithUser>(
            r#"
                SELECT w.id, w.user_id, w.amount, w.wallet_address, w.status,
                       w.created_at, u.username
                FROM withdrawals w
                LEFT JOIN users u ON u.id = w.user_id
                ORDER BY w.created_at DESC
            "#,
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(withdrawals)
    }

    /// Moves a withdrawal out of 'pending'. The status flip is conditional,
    /// so only one of two concurrent resolutions wins; the refund rides in
    /// the same transaction as the flip, which rules out a double refund.
    /// Returns None when the withdrawal is missing or already terminal.
    pub async fn resolve_pending(
        &self,
        id: i32,
        status: &str,
        refund: bool,
    ) -> Result<Option<withdrawals::Withdrawal>, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let withdrawal = sqlx::query_as::<_, withdrawals::Withdrawal>(
            r#"
                UPDATE withdrawals SET status = $1
                WHERE id = $2 AND status = 'pending'
                RETURNING *
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let withdrawal = match withdrawal {
            Some(w) => w,
            None => return Ok(None),
        };

        if refund {
            sqlx::query("UPDATE users SET balance = balance + $1 WHERE id = $2")
                .bind(withdrawal.amount)
                .bind(withdrawal.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Some(withdrawal))
    }
}
