use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{LedgerError, RequestHandler, Service};
use crate::models::tasks::{CompletedTask, NewTask, Task};
use crate::repositories::tasks::TaskRepository;
use crate::repositories::users::UserRepository;

pub struct TaskBoard {
    pub tasks: Vec<Task>,
    pub completed_tasks: Vec<CompletedTask>,
}

pub enum TaskRequest {
    /// Active tasks plus the caller's completion set. Inactive tasks are
    /// filtered out here; completion itself does not re-check the flag.
    ListForUser {
        telegram_id: String,
        response: oneshot::Sender<Result<TaskBoard, LedgerError>>,
    },
    ListAll {
        response: oneshot::Sender<Result<Vec<Task>, LedgerError>>,
    },
    Create {
        task: NewTask,
        response: oneshot::Sender<Result<Task, LedgerError>>,
    },
    Delete {
        task_id: i32,
        response: oneshot::Sender<Result<(), LedgerError>>,
    },
}

#[derive(Clone)]
pub struct TaskRequestHandler {
    tasks: TaskRepository,
    users: UserRepository,
}

impl TaskRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        TaskRequestHandler {
            tasks: TaskRepository::new(sql_conn.clone()),
            users: UserRepository::new(sql_conn),
        }
    }

    async fn list_for_user(&self, telegram_id: &str) -> Result<TaskBoard, LedgerError> {
        let user = self
            .users
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or(LedgerError::NotFound("User"))?;

        let tasks = self.tasks.get_active_tasks().await?;
        let completed_tasks = self.tasks.get_completed_tasks(user.id).await?;

        Ok(TaskBoard {
            tasks,
            completed_tasks,
        })
    }

    async fn create(&self, task: &NewTask) -> Result<Task, LedgerError> {
        let task = self.tasks.insert_task(task).await?;

        log::info!("Created task {} ({})", task.id, task.title);

        Ok(task)
    }

    async fn delete(&self, task_id: i32) -> Result<(), LedgerError> {
        self.tasks.delete_task(task_id).await?;

        Ok(())
    }
}

#[async_trait]
impl RequestHandler<TaskRequest> for TaskRequestHandler {
    async fn handle_request(&self, request: TaskRequest) {
        match request {
            TaskRequest::ListForUser {
                telegram_id,
                response,
            } => {
                let result = self.list_for_user(&telegram_id).await;
                let _ = response.send(result);
            }
            TaskRequest::ListAll { response } => {
                let result = self.tasks.get_tasks().await.map_err(LedgerError::Storage);
                let _ = response.send(result);
            }
            TaskRequest::Create { task, response } => {
                let result = self.create(&task).await;
                let _ = response.send(result);
            }
            TaskRequest::Delete { task_id, response } => {
                let result = self.delete(task_id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct TaskService;

impl TaskService {
    pub fn new() -> Self {
        TaskService {}
    }
}

#[async_trait]
impl Service<TaskRequest, TaskRequestHandler> for TaskService {}
