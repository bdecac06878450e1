//! # Tank Arena Client Library
//!
//! A headless client for the tank arena server. It connects over TCP, logs in,
//! mirrors the authoritative world from the server's messages and can drive a
//! tank with a scripted autopilot.
//!
//! ## Architecture Overview
//!
//! The server owns every decision. The client sends commands (move, fire) and
//! applies whatever the server reports back: the full world on login, new
//! objects, removed objects and status deltas. Nothing is predicted locally,
//! so the mirror is always a slightly delayed copy of the server's world.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The local mirror:
//! - Object snapshots keyed by id
//! - The player's own user id and tank
//! - Game over detection when the tank is destroyed
//! - Saving and restoring the mirrored world
//!
//! ### Autopilot Module (`autopilot`)
//! Produces move and fire commands in place of keyboard input, either
//! randomly or from a fixed seed for reproducible runs.
//!
//! ### Network Module (`network`)
//! Manages the server connection:
//! - Socket setup and framing
//! - Login handshake with explicit rejection
//! - The main loop multiplexing server messages and autopilot commands
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::autopilot::Autopilot;
//! use client::network::Client;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:8080").await?;
//!     client.login("c1", "123456").await?;
//!     client
//!         .run(Autopilot::default(), Duration::from_millis(200), None)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod autopilot;
pub mod error;
pub mod game;
pub mod network;

pub use error::ClientError;
