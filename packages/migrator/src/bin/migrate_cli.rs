//! CLI for migrating a legacy forum into the target forum database.
//!
//! Source connection details and the migration toggles come in as flags;
//! target-side settings come from the environment (DATABASE_URL, ASSETS_DIR,
//! BASE_URL). Prints a JSON result line for scripting.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use migrator_core::migrate::{MigrationOptions, MigrationSummary, Migrator, RunContext};
use migrator_core::source::PgSource;
use migrator_core::store::{DirAssets, PgStore, PgUploads, UploadRegistry};
use migrator_core::Config;

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Migrate a legacy forum into the target forum database")]
struct Cli {
    /// Legacy database host
    #[arg(long)]
    source_host: String,

    /// Legacy database port
    #[arg(long, default_value_t = 5432)]
    source_port: u16,

    /// Legacy database user
    #[arg(long)]
    source_user: String,

    /// Legacy database password
    #[arg(long, default_value = "")]
    source_password: String,

    /// Legacy database name
    #[arg(long)]
    source_database: String,

    /// Legacy table prefix
    #[arg(long, default_value = "")]
    source_prefix: String,

    /// Filesystem root of the legacy forum (avatars and uploads live here)
    #[arg(long, default_value = ".")]
    source_path: PathBuf,

    /// Copy user avatars
    #[arg(long)]
    avatars: bool,

    /// Link users to their migrated groups
    #[arg(long)]
    user_groups: bool,

    /// Also migrate soft-deleted threads (hidden on the target)
    #[arg(long)]
    soft_deleted_threads: bool,

    /// Also migrate soft-deleted posts (hidden on the target)
    #[arg(long)]
    soft_deleted_posts: bool,

    /// Copy and register post attachments (needs the upload subsystem)
    #[arg(long)]
    attachments: bool,
}

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    counts: MigrationSummary,
}

fn output(resp: Response) {
    println!("{}", serde_json::to_string(&resp).unwrap());
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,migrator_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let source_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        cli.source_user, cli.source_password, cli.source_host, cli.source_port, cli.source_database
    );
    let source = PgSource::connect(&source_url, &cli.source_prefix)
        .await
        .context("Failed to connect to the legacy forum database")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the target forum database")?;

    // Capability probe: the upload subsystem may simply not be installed
    let uploads = PgUploads::probe(&pool)
        .await
        .context("Failed to probe for the upload subsystem")?
        .map(|u| Arc::new(u) as Arc<dyn UploadRegistry>);

    if cli.attachments && uploads.is_none() {
        tracing::warn!("upload subsystem not present; attachments will be skipped");
    }

    let options = MigrationOptions {
        migrate_avatars: cli.avatars,
        migrate_user_groups: cli.user_groups,
        include_soft_deleted_threads: cli.soft_deleted_threads,
        include_soft_deleted_posts: cli.soft_deleted_posts,
        migrate_attachments: cli.attachments,
    };

    let ctx = RunContext::new(
        Arc::new(source),
        Arc::new(PgStore::new(pool)),
        Arc::new(DirAssets::new(&config.assets_dir, &config.base_url)),
        uploads,
        cli.source_path,
        options,
    );

    let mut migrator = Migrator::new(ctx);

    // Stop between discussions on ctrl-c instead of mid-write
    let cancel = migrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stopping after the current discussion");
            cancel.cancel();
        }
    });

    match migrator.run().await {
        Ok(summary) => {
            output(Response {
                success: true,
                message: None,
                counts: summary,
            });
            Ok(())
        }
        Err(err) => {
            output(Response {
                success: false,
                message: Some(err.to_string()),
                counts: migrator.summary().clone(),
            });
            std::process::exit(1);
        }
    }
}
