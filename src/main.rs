//! Stanchion commitment attestation service.
//!
//! Main entry point. Initializes logging and storage, then runs the
//! aggregation loop that freezes client commitments into candidate round
//! commitments. Broadcast and confirmation are driven by the external
//! attester pipeline through the tracker API.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use stanchion_tracker::{AttestationTracker, PostgresTrackerStorage};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Stanchion commitment attestation service");

    let config = Config::from_env()?;
    info!(
        database_url = %config.database_url_masked(),
        max_connections = config.database_max_connections,
        aggregation_interval_secs = config.aggregation_interval.as_secs(),
        "Configuration loaded"
    );

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    run_migrations(&db_pool).await?;
    info!("Database schema ready");

    let storage = Arc::new(stanchion_store::Storage::new(db_pool.clone()));
    storage.health_check().await.context("Database health check failed")?;

    let tracker =
        Arc::new(AttestationTracker::new(Arc::new(PostgresTrackerStorage::new(storage))));

    let aggregation_handle = tokio::spawn({
        let tracker = tracker.clone();
        let interval = config.aggregation_interval;
        async move {
            aggregation_loop(tracker, interval).await;
        }
    });

    info!("Stanchion is tracking attestations");

    shutdown_signal().await;
    info!("Shutdown signal received, starting graceful shutdown");

    aggregation_handle.abort();
    db_pool.close().await;
    info!("Database connections closed");

    info!("Stanchion shutdown complete");
    Ok(())
}

/// Periodically freezes the current client commitments into a candidate
/// round and reports its root.
async fn aggregation_loop(tracker: Arc<AttestationTracker>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match tracker.client_commitment().await {
            Ok(candidate) => {
                info!(
                    root = %candidate.commitment_hash(),
                    positions = candidate.num_commitments(),
                    "Candidate commitment ready for attestation"
                );
            },
            Err(stanchion_tracker::TrackerError::Core(
                stanchion_core::CoreError::CommitmentListEmpty,
            )) => {
                debug!("No client commitments yet, skipping round");
            },
            Err(e) => {
                warn!(error = %e, "Candidate aggregation failed");
            },
        }
    }
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,stanchion=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    let mut retries = 0;
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(_e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}

/// Creates the schema when it does not exist yet.
async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attestations (
            txid BYTEA PRIMARY KEY,
            merkle_root BYTEA NOT NULL,
            confirmed BOOLEAN NOT NULL DEFAULT FALSE,
            inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create attestations table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attestation_info (
            txid BYTEA PRIMARY KEY,
            block_hash BYTEA NOT NULL,
            amount BIGINT NOT NULL,
            attested_at BIGINT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create attestation_info table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS merkle_commitments (
            merkle_root BYTEA NOT NULL,
            client_position INTEGER NOT NULL,
            commitment BYTEA NOT NULL,
            PRIMARY KEY (merkle_root, client_position)
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create merkle_commitments table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS merkle_proofs (
            merkle_root BYTEA NOT NULL,
            client_position INTEGER NOT NULL,
            commitment BYTEA NOT NULL,
            ops JSONB NOT NULL,
            PRIMARY KEY (merkle_root, client_position)
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create merkle_proofs table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_commitments (
            client_position INTEGER PRIMARY KEY,
            commitment BYTEA NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create client_commitments table")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_attestations_latest
        ON attestations (inserted_at DESC)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create attestations index")?;

    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Service configuration.
struct Config {
    /// PostgreSQL connection string.
    database_url: String,
    /// Maximum database connections.
    database_max_connections: u32,
    /// How often the candidate commitment is rebuilt.
    aggregation_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let aggregation_interval = std::env::var("AGGREGATION_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Self { database_url, database_max_connections, aggregation_interval })
    }

    /// Returns database URL with password masked for logging.
    fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(password_start) = self.database_url[..at_pos].rfind(':') {
                if let Some(user_start) = self.database_url[..password_start].rfind('/') {
                    return format!(
                        "{}//{}:***@{}",
                        &self.database_url[..user_start],
                        &self.database_url[user_start + 2..password_start],
                        &self.database_url[at_pos + 1..]
                    );
                }
            }
        }
        "postgresql://***".to_string()
    }
}
