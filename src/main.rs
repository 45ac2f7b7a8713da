use analytics::PeriodStats;
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, LoggingSettings, load_config};
use core_types::Period;
use database::{CacheRecord, DbRepository, connect, run_migrations};
use rust_decimal::Decimal;
use stats_cache::StatsCacheManager;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// The main entry point for the Tradelog statistics service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; settings may come from the environment directly.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Stats(args) => handle_stats(args, config).await,
        Commands::Invalidate(args) => handle_invalidate(args, config).await,
        Commands::Migrate => handle_migrate(config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Cached per-period trading statistics for journal accounts.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Print the statistics of an account.
    Stats(StatsArgs),
    /// Recompute every cached period of an account.
    Invalidate(AccountArgs),
    /// Apply pending database migrations.
    Migrate,
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on; overrides `[server] addr`.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct AccountArgs {
    #[arg(long)]
    user: Uuid,

    #[arg(long)]
    account: Uuid,
}

#[derive(Parser)]
struct StatsArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// A single period (TODAY, WEEK, MONTH, ALL_TIME). All configured periods if omitted.
    #[arg(long)]
    period: Option<Period>,
}

// ==============================================================================
// Setup
// ==============================================================================

/// Installs the global subscriber. `RUST_LOG` wins over `[logging] level`.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(settings: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer());

    match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "tradelog.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry.try_init()?;
            Ok(None)
        }
    }
}

async fn connect_repository(config: &Config) -> anyhow::Result<DbRepository> {
    let pool = connect(
        config.database.url.as_deref(),
        config.database.max_connections,
        config.database.acquire_timeout,
    )
    .await
    .context("Failed to connect to the database")?;
    Ok(DbRepository::new(pool))
}

fn build_manager(repo: DbRepository, config: &Config) -> StatsCacheManager {
    let repo = Arc::new(repo);
    StatsCacheManager::new(
        repo.clone(),
        repo.clone(),
        repo,
        config.stats_cache.clone(),
    )
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_serve(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let repo = connect_repository(&config).await?;
    run_migrations(repo.pool()).await?;

    let addr = args.addr.unwrap_or(config.server.addr);
    let state = web_server::AppState {
        manager: build_manager(repo, &config),
    };
    web_server::run_server(addr, state).await
}

async fn handle_stats(args: StatsArgs, config: Config) -> anyhow::Result<()> {
    let manager = build_manager(connect_repository(&config).await?, &config);
    let AccountArgs { user, account } = args.account;

    let stats = match args.period {
        Some(period) => vec![manager.get(user, account, period).await?],
        None => manager.get_all(user, account).await?,
    };

    println!("{}", stats_table(&stats));
    Ok(())
}

async fn handle_invalidate(args: AccountArgs, config: Config) -> anyhow::Result<()> {
    let manager = build_manager(connect_repository(&config).await?, &config);
    let records = manager.invalidate_all(args.user, args.account).await?;

    println!("{}", refresh_table(&records));
    Ok(())
}

async fn handle_migrate(config: Config) -> anyhow::Result<()> {
    let repo = connect_repository(&config).await?;
    run_migrations(repo.pool()).await?;
    println!("Database migrations applied.");
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn stats_table(stats: &[PeriodStats]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Period",
        "Total PnL",
        "Trades",
        "Wins",
        "Losses",
        "Win Rate %",
        "Avg Win",
        "Avg Loss",
        "Profit Factor",
        "Expectancy",
        "Largest Win",
        "Largest Loss",
    ]);

    for s in stats {
        table.add_row(vec![
            s.period.to_string(),
            money(s.total_pnl),
            s.total_trades.to_string(),
            s.wins.to_string(),
            s.losses.to_string(),
            money(s.win_rate),
            money(s.avg_win),
            money(s.avg_loss),
            s.profit_factor.map_or_else(|| "-".to_string(), money),
            s.expectancy.map_or_else(|| "-".to_string(), money),
            money(s.largest_win),
            money(s.largest_loss),
        ]);
    }
    table
}

fn refresh_table(records: &[CacheRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Period", "Total PnL", "Trades", "Equity Points", "Updated At"]);
    for record in records {
        table.add_row(vec![
            record.key.period.to_string(),
            money(record.computed.total_pnl),
            record.computed.total_trades.to_string(),
            record.equity_curve_snapshot.len().to_string(),
            timestamp(record.updated_at),
        ]);
    }
    table
}

fn money(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
