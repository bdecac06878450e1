//! Server configuration context
//!
//! Parsed once at start-up and shared by `Arc` with every component.

use clap::{Parser, ValueEnum};
use shared::{Direction, Rect};
use std::time::Duration;

/// Shortest tick the simulation accepts
pub const MIN_TICK_MS: u64 = 25;

/// How many bullets a single `ClientFire` produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FireStrategy {
    /// One bullet in the direction the tank is facing
    Default,
    /// One bullet in each of the four directions
    FourDirection,
}

impl FireStrategy {
    pub fn directions(self, facing: Direction) -> Vec<Direction> {
        match self {
            FireStrategy::Default => vec![facing],
            FireStrategy::FourDirection => Direction::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Authoritative tank arena server", long_about = None)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on (0 picks a free port)
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    pub port: u16,

    /// Simulation tick interval in milliseconds
    #[arg(
        short,
        long,
        default_value_t = 50,
        value_parser = clap::value_parser!(u64).range(MIN_TICK_MS..)
    )]
    pub tick_ms: u64,

    /// Maximum number of simultaneous connections
    #[arg(short, long, default_value_t = 64)]
    pub max_clients: usize,

    /// Shared login secret
    #[arg(long, default_value = shared::DEFAULT_PASSWORD)]
    pub password: String,

    #[arg(long, default_value_t = 100)]
    pub tank_health: i32,

    /// Pixels a tank advances per move command
    #[arg(long, default_value_t = 5)]
    pub tank_speed: i32,

    /// Edge length of the square tank
    #[arg(long, default_value_t = 50)]
    pub tank_size: i32,

    /// Pixels a bullet travels per tick
    #[arg(long, default_value_t = 10)]
    pub bullet_speed: i32,

    #[arg(long, default_value_t = 10)]
    pub bullet_damage: i32,

    #[arg(long, default_value_t = 20)]
    pub bullet_size: i32,

    /// Animation frames of an explosion; the step after the last one ends it
    #[arg(long, default_value_t = 16)]
    pub explosion_frames: u32,

    #[arg(long, default_value_t = shared::WORLD_WIDTH)]
    pub world_width: i32,

    #[arg(long, default_value_t = shared::WORLD_HEIGHT)]
    pub world_height: i32,

    #[arg(long, value_enum, default_value_t = FireStrategy::Default)]
    pub fire_strategy: FireStrategy,

    /// Bullets die when they hit a wall
    #[arg(long)]
    pub bullets_hit_walls: bool,

    /// Tanks are pushed back when they drive into a wall
    #[arg(long)]
    pub walls_block_tanks: bool,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(MIN_TICK_MS))
    }

    pub fn world_bounds(&self) -> Rect {
        shared::world_bounds(self.world_width, self.world_height)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::parse_from(["server"])
    }
}
