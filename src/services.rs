use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::settings::Settings;

mod bot_settings;
mod http;
mod ledger;
mod tasks;
mod users;

/// Everything a ledger operation can refuse. All variants are recoverable
/// and surfaced to the caller as a structured message.
#[derive(Debug, thiserror::Error)]
enum LedgerError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Already claimed today")]
    AlreadyClaimed,
    #[error("Task already completed")]
    AlreadyCompleted,
    #[error("Minimum withdrawal is {0} TON")]
    BelowMinimum(Decimal),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Withdrawal is already {0}")]
    InvalidState(String),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (ledger_tx, mut ledger_rx) = mpsc::channel(512);
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (task_tx, mut task_rx) = mpsc::channel(512);
    let (settings_tx, mut settings_rx) = mpsc::channel(512);

    let mut ledger_service = ledger::LedgerService::new();
    let mut user_service = users::UserService::new();
    let mut task_service = tasks::TaskService::new();
    let mut settings_service = bot_settings::SettingsService::new();

    println!("[*] Starting ledger service.");
    let ledger_pool_clone = pool.clone();
    tokio::spawn(async move {
        ledger_service
            .run(
                ledger::LedgerRequestHandler::new(ledger_pool_clone),
                &mut ledger_rx,
            )
            .await;
    });

    println!("[*] Starting user service.");
    let user_pool_clone = pool.clone();
    tokio::spawn(async move {
        user_service
            .run(
                users::UserRequestHandler::new(user_pool_clone),
                &mut user_rx,
            )
            .await;
    });

    println!("[*] Starting task service.");
    let task_pool_clone = pool.clone();
    tokio::spawn(async move {
        task_service
            .run(
                tasks::TaskRequestHandler::new(task_pool_clone),
                &mut task_rx,
            )
            .await;
    });

    log::info!("Starting settings service.");
    let settings_pool_clone = pool.clone();
    tokio::spawn(async move {
        settings_service
            .run(
                bot_settings::SettingsRequestHandler::new(settings_pool_clone),
                &mut settings_rx,
            )
            .await;
    });

    println!("[*] Starting HTTP server.");
    http::start_http_server(&settings.http.listen, ledger_tx, user_tx, task_tx, settings_tx).await
}
