use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clog_adviser::api::state::AppState;
use clog_adviser::calculate::{estimate_activity, item_statuses, rank_activities, RankingOptions};
use clog_adviser::catalog::{load_source, Catalog, CatalogStore};
use clog_adviser::collection_log::{CollectionLog, DEFAULT_RECENT_ITEMS};
use clog_adviser::config::AppConfig;
use clog_adviser::fetch::{FileLogSource, LogSource, RemoteClient};
use clog_adviser::models::{AccountVariant, ActivityEstimate, RankBy, RateOverrides};

#[derive(Parser)]
#[command(name = "clog-adviser")]
#[command(about = "Rank activities by expected time to the next collection log slot")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalog tables and report what was found
    CheckCatalog,

    /// Rank activities for a collection log
    Estimate {
        /// Collection log JSON file
        #[arg(long, conflicts_with = "username", required_unless_present = "username")]
        log: Option<PathBuf>,

        /// Fetch the log from collectionlog.net
        #[arg(long)]
        username: Option<String>,

        /// Use ironman rates (default: taken from the log's account type)
        #[arg(long, conflicts_with = "main")]
        iron: bool,

        /// Use main-account rates
        #[arg(long)]
        main: bool,

        /// Ranking key: next-log-slot or base-time
        #[arg(long, default_value = "next-log-slot")]
        rank_by: RankBy,

        /// Show only the first N activities
        #[arg(long)]
        limit: Option<usize>,

        /// JSON file of per-activity rate overrides
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show per-item progress for one activity
    Status {
        /// Collection log JSON file
        #[arg(long)]
        log: PathBuf,

        /// Activity index
        #[arg(long)]
        activity: u32,

        /// Use ironman rates
        #[arg(long)]
        iron: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Summarize a collection log file
    Summary {
        /// Collection log JSON file
        #[arg(long)]
        log: PathBuf,

        /// Number of recent items to list
        #[arg(long, default_value_t = DEFAULT_RECENT_ITEMS)]
        recent: usize,
    },

    /// Start the API server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// The effective config and whether it came from a file.
fn load_config(cli: &Cli) -> Result<(AppConfig, bool)> {
    let found = cli.config.exists();
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level.clone() {
        config.log_level = log_level;
    }
    Ok((config, found))
}

fn load_catalog(config: &AppConfig) -> Result<Catalog> {
    let source = config.catalog_source();
    let report = load_source(&source).with_context(|| {
        format!(
            "loading catalog from {} and {}",
            source.activities_path.display(),
            source.drop_items_path.display()
        )
    })?;
    tracing::info!(
        "Loaded {} activities ({} drop items, fingerprint {})",
        report.catalog.len(),
        report.catalog.item_count(),
        report.catalog.fingerprint().short()
    );
    Ok(report.catalog)
}

fn read_overrides(path: &Path) -> Result<RateOverrides> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading overrides from {}", path.display()))?;
    let overrides: RateOverrides = serde_json::from_str(&content)
        .with_context(|| format!("parsing overrides from {}", path.display()))?;
    overrides.validate()?;
    Ok(overrides)
}

fn resolve_variant(iron: bool, main: bool, log: &CollectionLog) -> AccountVariant {
    if iron {
        AccountVariant::Iron
    } else if main {
        AccountVariant::Main
    } else {
        log.account_variant()
    }
}

fn print_estimates(estimates: &[ActivityEstimate]) {
    println!(
        "{:>4}  {:>5}  {:<32} {:>18} {:>12} {:>12} {:>10}  Fastest slot",
        "#", "Index", "Activity", "Next slot", "Exact (h)", "E&I (h)", "Base (h)"
    );
    for (rank, e) in estimates.iter().enumerate() {
        let fastest = e
            .fastest_slot
            .as_ref()
            .map(|s| format!("{} (1/{})", s.item_name, s.drop_rate_attempts))
            .unwrap_or_default();
        println!(
            "{:>4}  {:>5}  {:<32} {:>18} {:>12} {:>12} {:>10}  {}",
            rank + 1,
            e.activity_index,
            e.activity_name,
            e.time_to_next_log_slot.to_string(),
            e.time_to_exact.to_string(),
            e.time_to_ei.to_string(),
            e.base_time_hours.to_string(),
            fastest
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_found) = load_config(&cli)?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting clog-adviser v{}", env!("CARGO_PKG_VERSION"));
    if !config_found {
        tracing::info!(
            "Config file {} not found, using defaults",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::CheckCatalog => {
            let source = config.catalog_source();
            let report = load_source(&source)?;

            println!("\n=== Catalog ===");
            println!("Activities:  {}", report.catalog.len());
            println!("Drop items:  {}", report.catalog.item_count());
            println!("Fingerprint: {}", report.catalog.fingerprint());
            if !report.warnings.is_empty() {
                println!("\nSkipped rows:");
                for warning in &report.warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Commands::Estimate {
            log,
            username,
            iron,
            main,
            rank_by,
            limit,
            overrides,
            json,
        } => {
            let catalog = load_catalog(&config)?;

            let source: Box<dyn LogSource> = match (log, username) {
                (Some(path), _) => Box::new(FileLogSource::new(path)),
                (None, Some(name)) => {
                    Box::new(RemoteClient::new(config.remote_source())?.for_user(name))
                }
                (None, None) => bail!("either --log or --username is required"),
            };
            tracing::info!("Reading collection log from {}", source.describe());
            let collection_log = source.fetch_log().await?;

            let mut options = RankingOptions::for_variant(resolve_variant(
                iron,
                main,
                &collection_log,
            ))
            .rank_by(rank_by);
            if let Some(path) = overrides {
                options = options.with_overrides(read_overrides(&path)?);
            }
            if let Some(limit) = limit {
                options = options.with_limit(limit);
            }

            let estimates = rank_activities(&catalog, &collection_log.obtained_set(), &options);

            if json {
                println!("{}", serde_json::to_string_pretty(&estimates)?);
            } else {
                println!(
                    "\n=== {} ({} account, {} items obtained) ===\n",
                    collection_log.username,
                    options.variant,
                    collection_log.obtained_set().len()
                );
                print_estimates(&estimates);
            }
        }
        Commands::Status {
            log,
            activity,
            iron,
            json,
        } => {
            let catalog = load_catalog(&config)?;
            let collection_log = FileLogSource::new(log).fetch_log().await?;
            let obtained = collection_log.obtained_set();

            let Some(entry) = catalog.get_activity(activity) else {
                bail!("activity {} not found in catalog", activity);
            };
            let variant = resolve_variant(iron, false, &collection_log);
            let estimate = estimate_activity(entry, variant, &obtained);
            let items = item_statuses(entry, &obtained);

            if json {
                let body = serde_json::json!({ "estimate": estimate, "items": items });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("\n=== {} ({} account) ===", entry.activity_name, variant);
                println!("Next log slot: {}", estimate.time_to_next_log_slot);
                println!("Base time:     {} h", estimate.base_time_hours);
                println!();
                for item in &items {
                    let state = if item.obtained {
                        "obtained"
                    } else if item.active {
                        "active"
                    } else {
                        "locked"
                    };
                    println!(
                        "  {:>2}. {:<32} 1/{:<10} {}",
                        item.sequence, item.item_name, item.drop_rate_attempts, state
                    );
                }
            }
        }
        Commands::Summary { log, recent } => {
            let collection_log = FileLogSource::new(log).fetch_log().await?;
            let summary = collection_log.summary(recent);

            println!("\n=== {} ({}) ===", summary.username, summary.account_type);
            println!(
                "Unique obtained: {}/{}",
                summary.unique_obtained, summary.unique_items
            );
            for count in &summary.category_counts {
                println!("  {:<10} {}/{}", count.section, count.obtained, count.total);
            }
            if !summary.recent_items.is_empty() {
                println!("\nRecent items:");
                for item in &summary.recent_items {
                    println!(
                        "  - {} ({})",
                        item.name,
                        item.obtained_at.as_deref().unwrap_or_default()
                    );
                }
            }
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let catalog = match load_catalog(&config) {
                Ok(catalog) => catalog,
                Err(e) => {
                    tracing::warn!("Starting with an empty catalog: {:#}", e);
                    Catalog::empty()
                }
            };
            let store = CatalogStore::with_source(catalog, config.catalog_source());
            let addr = config.bind_address();
            let state = AppState::new(Arc::new(store), Arc::new(config))?;

            let app = clog_adviser::api::build_router(state);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}/api", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from([
            "clog-adviser",
            "--config",
            path.to_str().unwrap(),
            "--log-level",
            "debug",
            "check-catalog",
        ])
        .unwrap();

        let (config, found) = load_config(&cli).unwrap();
        assert!(!found);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_config_file_is_reported_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let cli = Cli::try_parse_from([
            "clog-adviser",
            "--config",
            path.to_str().unwrap(),
            "--data-dir",
            "/srv/clog",
            "check-catalog",
        ])
        .unwrap();

        let (config, found) = load_config(&cli).unwrap();
        assert!(found);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.data_dir, PathBuf::from("/srv/clog"));
    }
}
