use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use camera_recordings::config::Config;
use camera_recordings::db::SyncDb;
use camera_recordings::recordings::{self, DeleteScope};
use camera_recordings::resolver::resolve_fragments;
use camera_recordings::store;

#[derive(Parser, Debug)]
#[command(author, version, about = "Query and prune camera recordings and their video fragments")]
struct Args {
    /// Path to config file (TOML format)
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema
    Init,
    /// List recordings, for one camera or all configured cameras
    List {
        /// Camera identifier (default: all cameras)
        #[arg(long)]
        camera: Option<String>,
        /// Only recordings started on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the latest recording
    Latest {
        /// Camera identifier (default: all cameras)
        #[arg(long)]
        camera: Option<String>,
        /// Only recordings started on this date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "daily")]
        date: Option<NaiveDate>,
        /// Latest recording of every day instead
        #[arg(long)]
        daily: bool,
    },
    /// Delete recordings and their fragments
    Delete {
        /// Camera identifier
        #[arg(long)]
        camera: String,
        /// Only recordings started on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Recording filename (<start>.mp4), requires --date
        #[arg(long, requires = "date")]
        filename: Option<String>,
        /// Lookback in seconds used to resolve fragments (overrides config file)
        #[arg(long)]
        lookback: Option<u64>,
    },
    /// Print the fragments a recording resolves to
    Fragments {
        /// Recording id
        #[arg(long)]
        recording: i64,
        /// Lookback in seconds (overrides config file)
        #[arg(long)]
        lookback: Option<u64>,
    },
}

#[derive(Serialize)]
struct FragmentInfo {
    path: String,
    tier_id: i64,
    tier: Option<String>,
    on_tier: bool,
    start: i64,
    duration: Option<f64>,
    size: i64,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cameras an operation applies to; a camera missing from the registry is not found.
fn select_cameras(
    config: &Config,
    camera: Option<&str>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    match camera {
        Some(identifier) => {
            if config.camera(identifier).is_none() {
                return Err(format!("Camera {} not found", identifier).into());
            }
            Ok(vec![identifier.to_string()])
        }
        None => {
            let cameras = config.camera_identifiers();
            if cameras.is_empty() {
                return Err("No cameras found".into());
            }
            Ok(cameras)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let db = SyncDb::connect(&config.database)?;

    match args.command {
        Command::Init => {
            println!("Database ready: {}", config.database.display());
        }
        Command::List { camera, date } => {
            let cameras = select_cameras(&config, camera.as_deref())?;
            let all = db.block_on(recordings::list_recordings_all(db.pool(), &cameras, date))?;
            print_json(&all)?;
        }
        Command::Latest {
            camera,
            date,
            daily,
        } => {
            let cameras = select_cameras(&config, camera.as_deref())?;
            if daily {
                let all = db.block_on(recordings::latest_recording_daily_all(db.pool(), &cameras))?;
                print_json(&all)?;
            } else {
                let all = db.block_on(recordings::latest_recording_all(db.pool(), &cameras, date))?;
                print_json(&all)?;
            }
        }
        Command::Delete {
            camera,
            date,
            filename,
            lookback,
        } => {
            select_cameras(&config, Some(&camera))?;
            let scope = DeleteScope::from_parts(date, filename.as_deref())?;
            let lookback = lookback.unwrap_or(config.default_lookback);
            let report = db.block_on(recordings::try_delete_recordings(
                db.pool(),
                &camera,
                &scope,
                lookback,
            ))?;
            print_json(&report)?;
        }
        Command::Fragments {
            recording,
            lookback,
        } => {
            let lookback = lookback.unwrap_or(config.default_lookback);
            let found = db
                .block_on(store::get_recording(db.pool(), recording))?
                .ok_or_else(|| format!("Recording {} not found", recording))?;
            let fragments = db.block_on(resolve_fragments(db.pool(), &found, lookback))?;

            let tiers = config.tiers();
            let infos: Vec<FragmentInfo> = fragments
                .iter()
                .map(|fragment| FragmentInfo {
                    path: fragment.file.path.clone(),
                    tier_id: fragment.file.tier_id.0,
                    tier: tiers.tier_for(&fragment.file).map(|tier| tier.name.clone()),
                    on_tier: tiers.contains(&fragment.file),
                    start: fragment.start.secs(),
                    duration: fragment.meta.duration,
                    size: fragment.file.size,
                })
                .collect();
            print_json(&infos)?;
        }
    }

    Ok(())
}
