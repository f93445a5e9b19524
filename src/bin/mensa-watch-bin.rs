use mensa_watch_rs::constants::{CANTEEN_ID_KEY, DEFAULT_API_URL, DEFAULT_DB, PRICING_TIER_KEY};
use mensa_watch_rs::data_backend::openmensa_parser::MenuClient;
use mensa_watch_rs::data_types::PricingTier;
use mensa_watch_rs::db_operations::ConfigStore;
use mensa_watch_rs::shared_main::{logger_init, run_stdio_session};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::log_enabled;
use std::path::PathBuf;

/// Companion for the OpenMensa watch app.
/// {n}Talks to the watch as one JSON dictionary per line on stdin/stdout.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// SQLite file holding the canteen ID and pricing tier
    #[arg(long, env = "MENSA_DB", default_value = DEFAULT_DB)]
    db: PathBuf,
    /// OpenMensa API base URL
    #[arg(long, env = "OPENMENSA_API", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Enable verbose logging (request timings, every sent message){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Serve the watch on stdin/stdout
    Run,
    /// Store the canteen ID and/or pricing tier
    Configure {
        /// Canteen ID as listed on OpenMensa (https://openmensa.org/c/ID)
        #[arg(short, long)]
        canteen: Option<String>,
        /// students, employees, pupils or others
        #[arg(short, long)]
        tier: Option<PricingTier>,
        /// Raw settings page response, {"openmensaID": {"value": ...}}
        #[arg(long)]
        settings_json: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    //// Args setup
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());

    if !(log_enabled!(log::Level::Debug) || log_enabled!(log::Level::Trace)) {
        log::info!("Enable verbose logging for request timings");
    }

    let config = ConfigStore::open(&args.db)
        .with_context(|| format!("opening config db {}", args.db.display()))?;

    match args.command {
        Cmd::Run => {
            log::info!("Starting session against {}", args.api_url);
            run_stdio_session(config, MenuClient::new(&args.api_url)).await;
        }
        Cmd::Configure {
            canteen,
            tier,
            settings_json,
        } => {
            if canteen.is_none() && tier.is_none() && settings_json.is_none() {
                bail!("nothing to configure, pass --canteen, --tier or --settings-json");
            }

            if let Some(response) = settings_json {
                let written = config.apply_settings_response(&response)?;
                log::info!("saved from settings page: {}", written.join(", "));
            }
            if let Some(canteen) = canteen {
                config.set(CANTEEN_ID_KEY, canteen.trim())?;
            }
            if let Some(tier) = tier {
                config.set(PRICING_TIER_KEY, tier.as_str())?;
            }

            log::info!(
                "canteen: {}, tier: {}",
                config.canteen_id()?.as_deref().unwrap_or("<unset>"),
                config.pricing_tier()?
            );
        }
    }

    Ok(())
}
