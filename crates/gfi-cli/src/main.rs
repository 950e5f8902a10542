use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gfi_config::{ImportSettings, LoadedConfig, UnusedKeyPolicy};
use gfi_reconcile::AreaType;
use tracing::{info, warn};

mod commands;

#[derive(Parser)]
#[command(name = "gfi")]
#[command(about = "Geofence import: reconcile imported areas into fleet locations", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> env -> local)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one area type's source rows into a fleet's locations
    Import {
        /// Fleet whose locations are reconciled
        fleet_id: i64,

        /// AreaCollection | Keep-In | Location | NoGo | speedArea
        #[arg(value_parser = AreaType::parse)]
        area_type: AreaType,

        /// Print the run report as JSON instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List accepted area type names and their destination flag columns
    AreaTypes,

    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Import {
            fleet_id,
            area_type,
            json,
        } => {
            let settings = bootstrap(&cli.config_paths)?;
            commands::import::run(&settings, fleet_id, area_type, json).await?;
        }

        Commands::AreaTypes => {
            let mut all = AreaType::ALL.to_vec();
            all.sort_by_key(|a| a.as_str().to_ascii_lowercase());
            for a in all {
                println!("area_type={} column={}", a.as_str(), a.flag_column());
            }
        }

        Commands::Db { cmd } => {
            let settings = bootstrap(&cli.config_paths)?;
            let target = settings.database.resolve()?;
            let pool = gfi_db::connect_resolved(&target, settings.database.max_connections).await?;
            match cmd {
                DbCmd::Status => {
                    let s = gfi_db::status(&pool).await?;
                    println!(
                        "db_ok={} has_locations_import={} has_fleet_locations={}",
                        s.ok, s.has_import_table, s.has_fleet_locations_table
                    );
                }
                DbCmd::Migrate => {
                    gfi_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let loaded = load_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    gfi_config::load_layered_yaml(&path_refs).context("failed to load config")
}

/// Load settings (defaults when no `--config` is given) and install tracing.
fn bootstrap(paths: &[String]) -> Result<ImportSettings> {
    if paths.is_empty() {
        let settings = ImportSettings::default();
        init_tracing(&settings.logging.filter);
        return Ok(settings);
    }

    let loaded = load_config(paths)?;
    let settings = ImportSettings::from_config_json(&loaded.config_json)
        .context("invalid import settings")?;
    init_tracing(&settings.logging.filter);

    let report = gfi_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config contains keys nothing reads");
    }
    info!(config_hash = %loaded.config_hash, "config loaded");
    Ok(settings)
}

/// `RUST_LOG` wins; otherwise the configured filter.
fn init_tracing(fallback: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| gfi_config::DEFAULT_LOG_FILTER.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
