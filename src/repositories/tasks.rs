use crate::models::tasks;

use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Clone)]
pub struct TaskRepository {
    conn: PgPool,
}

impl TaskRepository {
    pub fn new(conn: PgPool) -> Self {
        TaskRepository { conn }
    }

    pub async fn get_tasks(&self) -> Result<Vec<tasks::Task>, anyhow::Error> {
        let tasks = sqlx::query_as::<_, tasks::Task>("SELECT * FROM tasks ORDER BY created_at")
            .fetch_all(&self.conn)
            .await?;

        Ok(tasks)
    }

    pub async fn get_active_tasks(&self) -> Result<Vec<tasks::Task>, anyhow::Error> {
        let tasks = sqlx::query_as::<_, tasks::Task>(
            "SELECT * FROM tasks WHERE is_active = TRUE ORDER BY created_at",
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(tasks)
    }

    pub async fn get_task(&self, id: i32) -> Result<Option<tasks::Task>, anyhow::Error> {
        let task = sqlx::query_as::<_, tasks::Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(task)
    }

    pub async fn insert_task(&self, task: &tasks::NewTask) -> Result<tasks::Task, anyhow::Error> {
        let inserted = sqlx::query_as::<_, tasks::Task>(
            r#"
                INSERT INTO tasks (type, title, description, url, reward, icon, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            "#,
        )
        .bind(&task.task_type)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.url)
        .bind(task.reward.unwrap_or_else(|| Decimal::new(1, 5)))
        .bind(task.icon.as_deref().unwrap_or("gift"))
        .bind(task.is_active.unwrap_or(true))
        .fetch_one(&self.conn)
        .await?;

        Ok(inserted)
    }

    pub async fn delete_task(&self, id: i32) -> Result<(), anyhow::Error> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn get_completed_tasks(
        &self,
        user_id: i32,
    ) -> Result<Vec<tasks::CompletedTask>, anyhow::Error> {
        let completed = sqlx::query_as::<_, tasks::CompletedTask>(
            "SELECT * FROM completed_tasks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(completed)
    }

    /// Records the completion and credits the reward in one transaction.
    /// The UNIQUE (user_id, task_id) index makes a duplicate insert a no-op,
    /// so a concurrent double submission rewards at most once. Returns the
    /// updated balance, or None when the task was already completed.
    pub async fn complete_task_once(
        &self,
        user_id: i32,
        task_id: i32,
        reward: Decimal,
    ) -> Result<Option<Decimal>, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let inserted = sqlx::query(
            r#"
                INSERT INTO completed_tasks (user_id, task_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, task_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(None);
        }

        let balance = sqlx::query_scalar::<_, Decimal>(
            "UPDATE users SET balance = balance + $1 WHERE id = $2 RETURNING balance",
        )
        .bind(reward)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(balance))
    }
}
