use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

use application::auth::AuthSettings;
use application::dto::{AddDaysRequest, InitializeRequest};
use config::{Cli, Commands};
use infrastructure::history_repo::HistoryRepository;
use infrastructure::registry_repo::RegistryRepository;
use infrastructure::schedule_repo::ScheduleRepository;
use infrastructure::user_repo::UserRepository;

// 全てのリポジトリと認証設定を保持するコンテナ
pub struct AppServices {
    pub schedule: ScheduleRepository,
    pub history: HistoryRepository,
    pub registry: RegistryRepository,
    pub users: UserRepository,
    pub auth: AuthSettings,
}

impl AppServices {
    pub fn new(pool: SqlitePool, auth: AuthSettings) -> Self {
        Self {
            // poolは内部で参照カウントされているのでcloneしても低コスト
            schedule: ScheduleRepository::new(pool.clone()),
            history: HistoryRepository::new(pool.clone()),
            registry: RegistryRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            auth,
        }
    }
}

// =====================
// ログ
// =====================

/// RUST_LOG があればそれを, なければ info
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =====================
// DB
// =====================

/// 接続を開いてマイグレーションまで済ませる
pub async fn open_pool(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid DATABASE_URL {}", database_url))?
        .create_if_missing(true); // ファイルがなければ作る

    // --- ディレクトリ作成（冪等） ---
    if let Some(dir) = options.get_filename().parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }
    tracing::info!("Using DB at: {}", options.get_filename().display());

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("failed to open db")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(pool)
}

// =====================
// エントリポイント
// =====================

pub async fn serve(services: Arc<AppServices>, bind_addr: SocketAddr) -> anyhow::Result<()> {
    let app = application::routes::router(services);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = open_pool(&cli.database_url, cli.db_max_connections).await?;
    let secret = cli.jwt_secret.unwrap_or_default();

    match cli.command {
        Commands::Serve { bind_addr } => {
            if secret.is_empty() {
                anyhow::bail!("JWT_SECRET must be set to run the server");
            }
            let services = Arc::new(AppServices::new(pool, AuthSettings::new(secret, cli.token_ttl_secs)));
            serve(services, bind_addr).await
        }
        Commands::InitGrid { num_vans, num_days, start_date } => {
            let services = AppServices::new(pool, AuthSettings::new(secret, cli.token_ttl_secs));
            let req = InitializeRequest {
                num_vans: Some(num_vans),
                num_days: Some(num_days),
                start_date: Some(start_date),
            };
            let result = application::commands::initialize_grid(&services, req).await?;
            println!("{} ({} cells)", result.message, result.outcome.written);
            Ok(())
        }
        Commands::AddDays { end_date, start_date } => {
            let services = AppServices::new(pool, AuthSettings::new(secret, cli.token_ttl_secs));
            let req = AddDaysRequest {
                start_date,
                end_date: Some(end_date),
            };
            let result = application::commands::add_days(&services, req).await?;
            println!("{} ({} cells)", result.message, result.outcome.written);
            Ok(())
        }
    }
}
