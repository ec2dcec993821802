//! # ImageShare Server
//!
//! Binary entry point: loads configuration, connects to PostgreSQL, applies
//! migrations and serves the v1 API.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use imageshare_core::{
    admin::AdminService,
    application::unit_of_work::AppUnitOfWork,
    auth::AuthCrypto,
    database::PostgresDatabase,
    mail::LogMailer,
    storage::LocalImageStorage,
};
use imageshare_server::{AppState, create_app, infra::config::Config};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "imageshare-server")]
#[command(about = "Image upload and sharing API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Give an account the admin role
    GrantAdmin { username: String },
    /// Take the admin role away from an account
    RevokeAdmin { username: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&cli.serve)?;

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(&config).await,
        Some(Command::User(command)) => run_user_command(&config, command).await,
        None => run_server(config).await,
    }
}

fn load_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut config = Config::from_env().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server_host = host;
    }

    if let Some(path) = &config.config_file {
        info!(path = %path.display(), "configuration file loaded");
    }
    if config.uses_default_secrets() {
        if config.dev_mode {
            warn!("using placeholder auth secrets; set AUTH_PASSWORD_PEPPER and AUTH_TOKEN_KEY");
        } else {
            anyhow::bail!(
                "AUTH_PASSWORD_PEPPER and AUTH_TOKEN_KEY must be set outside of dev mode"
            );
        }
    }
    Ok(config)
}

async fn connect(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be provided")?;
    let pg = PostgresDatabase::new(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(stats = ?pg.pool_stats(), "connected to PostgreSQL");
    Ok(pg)
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pg = connect(config).await?;
    pg.initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_user_command(config: &Config, command: UserCommand) -> anyhow::Result<()> {
    let pg = connect(config).await?;
    let admin = AdminService::new(&AppUnitOfWork::from_postgres(&pg));
    let (username, grant) = match &command {
        UserCommand::GrantAdmin { username } => (username, true),
        UserCommand::RevokeAdmin { username } => (username, false),
    };
    let user = admin
        .set_admin(username, grant)
        .await
        .with_context(|| format!("failed to update roles for '{username}'"))?;
    info!(user = %user.username, roles = ?user.roles, "roles updated");
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    config.ensure_directories()?;

    let pg = Arc::new(connect(&config).await?);
    pg.initialize_schema()
        .await
        .context("database migration failed")?;

    let crypto = Arc::new(
        AuthCrypto::new(
            config.auth_password_pepper.as_bytes(),
            config.auth_token_key.as_bytes(),
        )
        .context("failed to initialize authentication crypto helpers")?,
    );

    let storage = LocalImageStorage::new(&config.upload_dir);
    storage
        .ensure_root()
        .await
        .context("failed to prepare upload directory")?;

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server host or port")?;

    let unit_of_work = Arc::new(AppUnitOfWork::from_postgres(&pg));
    let state = AppState::new(
        Arc::new(config),
        unit_of_work,
        crypto,
        Arc::new(LogMailer),
        Arc::new(storage),
    )
    .with_postgres(pg);

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "ImageShare server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
