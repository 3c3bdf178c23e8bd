// src/main.rs
use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use poll_schema::binance::BinanceClient;
use poll_schema::cli::{Cli, Commands};
use poll_schema::handlers::AppState;
use poll_schema::{db, routes, schema, services, AppError, CoinStore, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> Result<(), AppError> {
    let pool = db::create_pool(&config).await?;

    match command {
        Commands::Migrate => {
            let applied = schema::run(&pool).await?;
            info!(count = applied.len(), "migrations complete");
        }
        Commands::Status => {
            for s in schema::status(&pool).await? {
                println!("{:>16}  {:<8}  {}", s.version, s.state, s.description);
            }
        }
        Commands::Serve { port } => {
            schema::run(&pool).await?;

            let state = AppState::new(CoinStore::new(pool.clone()));
            let app = routes::create_routes(state);

            let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
            let listener = TcpListener::bind(addr).await?;
            info!(%addr, "HTTP server listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::RefreshPrices => {
            let client = BinanceClient::new(config.binance_url.clone())?;
            let report = services::refresh_coin_prices(&CoinStore::new(pool.clone()), &client).await?;
            info!(updated = report.updated, missing = report.missing.len(), "refresh finished");
        }
    }

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
