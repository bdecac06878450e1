//! # Tank Arena Server Library
//!
//! This library provides the authoritative server for the multiplayer tank
//! arena. It owns the canonical world, applies player commands as they arrive
//! and streams state deltas back to every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Tanks, bullets, walls and explosions live only on the server. A fixed
//! interval tick resolves collisions, removes dead objects, moves bullets and
//! broadcasts the statuses that changed since the previous broadcast.
//!
//! ### Client Management
//! Handles the lifecycle of TCP connections:
//! - Admission with a capacity limit
//! - Login with a shared secret and tank creation
//! - Authorization of move and fire commands against the bound identity
//! - Deregistration as soon as a connection closes
//!
//! ## Architecture Design
//!
//! ### Concurrent Shared World
//! Every connection has its own reader and writer tasks, and one more task
//! runs the tick. All of them share the entity directory, a concurrent map of
//! entities that each guard their mutable state with their own lock.
//! Connection tasks lock a single entity at a time; only the tick locks two,
//! so locks never form a cycle.
//!
//! ### Framed TCP Protocol
//! Messages travel as length-prefixed frames over TCP (see [`shared::frame`]).
//! A frame with an impossible length closes the connection; a frame whose
//! body does not decode is dropped and the connection stays open.
//!
//! ## Module Organization
//!
//! ### Configuration (`config`)
//! Command line options with defaults for every tuning value.
//!
//! ### Entities (`entity`, `game`)
//! The entity lifecycle, movement and damage rules, the shared directory and
//! the factories that place new tanks, bullets, walls and explosions.
//!
//! ### Collisions (`collision`)
//! The ordered, first-match chain of pairwise detectors.
//!
//! ### Sessions (`session`)
//! Username, user id, tank and connection bindings.
//!
//! ### Networking (`client_manager`, `handler`, `network`)
//! The connection registry with its send primitives, message dispatch and the
//! TCP accept loop.
//!
//! ### Simulation (`simulation`)
//! The tick and its delta broadcasts.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod handler;
pub mod network;
pub mod session;
pub mod simulation;

pub use error::ServerError;
