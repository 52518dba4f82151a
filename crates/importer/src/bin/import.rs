use std::path::PathBuf;

use clap::{Parser, Subcommand};
use importer::{CatalogImporter, DataImporter, ImportContext, LegacyVotesImporter};
use storage::LegacyMirror;
use storage::backend::{BackendSettings, StorageBackendKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "twine-import")]
#[command(about = "Twine rating store import and maintenance tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "STORAGE_BACKEND", default_value = "sqlite")]
    backend: StorageBackendKind,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "FLAT_FILE_PATH", default_value = "data/ratings.json")]
    flat_file_path: PathBuf,

    #[arg(long, env = "MIRROR_DIR", default_value = "data/mirror")]
    mirror_dir: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert the scanner's projects.json into the projects table
    Catalog { file: PathBuf },
    /// Replay a legacy username -> project -> score file through the store
    LegacyVotes {
        file: PathBuf,

        /// Leave the legacy mirror files untouched
        #[arg(long)]
        no_mirror: bool,
    },
    /// Recompute every project's aggregate from the votes
    RebuildStats,
    /// Regenerate the legacy mirror files
    SyncMirror,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "import={},importer={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = BackendSettings {
        kind: cli.backend,
        database_url: cli.database_url.clone(),
        flat_file_path: cli.flat_file_path.clone(),
    };

    let mirror = LegacyMirror::new(&cli.mirror_dir);
    storage::backend::ensure_separate_from_mirror(&settings, &mirror)?;

    tracing::info!("Opening {} vote store", settings.kind);
    let store = storage::backend::open(&settings).await?;
    let context = ImportContext::new(store);

    match cli.command {
        Commands::Catalog { file } => {
            let report = CatalogImporter.import(&file, &context).await?;
            report.log_summary(&file);
        }
        Commands::LegacyVotes { file, no_mirror } => {
            let report = LegacyVotesImporter.import(&file, &context).await?;
            report.log_summary(&file);

            if !no_mirror {
                sync_mirror(&mirror, &context).await?;
            }
        }
        Commands::RebuildStats => match context.rebuild_stats().await? {
            Some(rebuilt) => tracing::info!("Rebuilt aggregates of {} projects", rebuilt),
            None => tracing::warn!(
                "The flat-file backend derives aggregates from its votes on every load, \
                 there is no persisted cache to rebuild"
            ),
        },
        Commands::SyncMirror => {
            sync_mirror(&mirror, &context).await?;
        }
    }

    let totals = context.store.totals().await?;
    tracing::info!(
        "Store holds {} votes on {} projects (overall average {})",
        totals.total_votes,
        totals.distinct_rated_projects,
        totals.overall_average
    );

    Ok(())
}

async fn sync_mirror(
    mirror: &LegacyMirror,
    context: &ImportContext,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = mirror.sync(context.store.as_ref()).await?;

    tracing::info!(
        "Legacy mirror written to {} ({} projects, {} users)",
        mirror.dir().display(),
        report.projects,
        report.users
    );

    Ok(())
}
