//! The authoritative tick
//!
//! Each tick resolves collisions, sweeps dead objects (turning dead tanks into
//! explosions), advances bullets and explosions, then broadcasts the statuses
//! that changed since the previous broadcast. A tick with no changes sends
//! nothing.

use crate::client_manager::ClientManager;
use crate::collision::CollisionChain;
use crate::game::GameState;
use log::{debug, info};
use shared::{Message, NewObject, ObjectDie, ObjectId, ObjectKind, ObjectStatus, StatusUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// What a single tick did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub collisions: usize,
    pub removed: usize,
    pub deltas: usize,
}

pub struct Simulation {
    game: Arc<GameState>,
    clients: Arc<ClientManager>,
    chain: CollisionChain,
    /// Last status broadcast for every object still in the world
    status_cache: HashMap<ObjectId, ObjectStatus>,
    explosion_frames: u32,
    tick: u64,
}

impl Simulation {
    pub fn new(game: Arc<GameState>, clients: Arc<ClientManager>) -> Self {
        let chain = CollisionChain::from_config(game.config());
        Self::with_chain(game, clients, chain)
    }

    pub fn with_chain(
        game: Arc<GameState>,
        clients: Arc<ClientManager>,
        chain: CollisionChain,
    ) -> Self {
        let explosion_frames = game.config().explosion_frames;
        Self {
            game,
            clients,
            chain,
            status_cache: HashMap::new(),
            explosion_frames,
            tick: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one tick
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let mut report = TickReport::default();

        // Snapshot first so no directory lock is held while entities are locked
        let entities = self.game.entities();
        report.collisions = self.chain.resolve_all(&entities);

        for entity in &entities {
            if entity.is_alive() {
                match entity.kind() {
                    ObjectKind::Explosion => entity.advance_explosion(self.explosion_frames),
                    ObjectKind::Bullet => {
                        entity.fly();
                    }
                    ObjectKind::Tank | ObjectKind::Wall => {}
                }
                continue;
            }

            if self.game.remove(entity.id()).is_none() {
                continue;
            }

            if entity.kind() == ObjectKind::Tank {
                let clients = &self.clients;
                self.game.create_explosion(entity, |object| {
                    clients.broadcast_message(&Message::NewObject(NewObject {
                        owner_user_id: None,
                        object: object.clone(),
                    }));
                });
                info!("Tank {} destroyed", entity.id());
            }

            self.status_cache.remove(entity.id());
            self.clients
                .broadcast_message(&Message::ObjectDie(ObjectDie {
                    id: entity.id().clone(),
                    type_name: entity.kind().type_name().to_string(),
                }));
            report.removed += 1;
        }

        let mut deltas = Vec::new();
        for entity in self.game.entities() {
            let status = entity.status();
            if self.status_cache.get(entity.id()) != Some(&status) {
                self.status_cache
                    .insert(entity.id().clone(), status.clone());
                deltas.push(status);
            }
        }

        report.deltas = deltas.len();
        if !deltas.is_empty() {
            self.clients
                .broadcast_message(&Message::StatusUpdate(StatusUpdate { list: deltas }));
        }

        report
    }

    /// Ticks forever at `tick_duration`. Late ticks are skipped, not bunched.
    pub async fn run(mut self, tick_duration: Duration) {
        let mut timer = interval(tick_duration);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Simulation running every {:?}", tick_duration);

        loop {
            timer.tick().await;
            let report = self.tick();

            if self.tick % 60 == 0 {
                debug!(
                    "Tick {}: {} objects, {} clients, last tick {:?}",
                    self.tick,
                    self.game.len(),
                    self.clients.len(),
                    report
                );
            }
        }
    }
}
