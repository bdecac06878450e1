use clap::Parser;
use client::autopilot::Autopilot;
use client::network::Client;
use log::{info, warn};
use shared::FileSaveStore;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Player name; logging in again with the same name keeps the user id
    #[arg(short = 'u', long, default_value = "player")]
    username: String,

    #[arg(short = 'p', long, default_value = shared::DEFAULT_PASSWORD)]
    password: String,

    /// Milliseconds between autopilot steps
    #[arg(short = 'c', long, default_value_t = 200)]
    cadence_ms: u64,

    /// Chance per step that the autopilot turns
    #[arg(long, default_value_t = 0.2)]
    turn_chance: f64,

    /// Chance per step that the autopilot fires
    #[arg(short = 'f', long, default_value_t = 0.1)]
    fire_chance: f64,

    /// Seed for a reproducible autopilot
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds instead of playing until the tank dies
    #[arg(short = 'd', long)]
    duration_secs: Option<u64>,

    /// Write the mirrored world to this file on exit
    #[arg(long)]
    save_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = Client::connect(&args.server).await?;
    client.login(&args.username, &args.password).await?;

    let autopilot = match args.seed {
        Some(seed) => Autopilot::seeded(seed, args.turn_chance, args.fire_chance),
        None => Autopilot::new(args.turn_chance, args.fire_chance),
    };
    let result = client
        .run(
            autopilot,
            Duration::from_millis(args.cadence_ms.max(1)),
            args.duration_secs.map(Duration::from_secs),
        )
        .await;

    if let Some(path) = args.save_file {
        let store = FileSaveStore::new(&path);
        match client.game_state().save(&store) {
            Ok(true) => info!("Saved game to {}", path.display()),
            Ok(false) => warn!("Nothing to save, no tank"),
            Err(e) => warn!("Failed to save game to {}: {}", path.display(), e),
        }
    }

    result?;
    Ok(())
}
