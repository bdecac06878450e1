//! Ordered, first-match pairwise collision rules
//!
//! A [`CollisionChain`] holds detectors in registration order. For every
//! unordered pair of entities the chain asks each detector in turn and stops
//! at the first one that handles the pair. Detectors lock both entities of a
//! pair, which is safe because only the tick task runs the chain.

use crate::config::ServerConfig;
use crate::entity::Entity;
use log::{debug, warn};
use shared::{ObjectBody, ObjectKind};
use std::sync::Arc;

pub trait CollisionDetector: Send + Sync {
    /// Unique name; the chain refuses a second detector with the same name
    fn name(&self) -> &'static str;

    /// Returns true when this detector handled the pair. May mutate either
    /// entity as a side effect.
    fn detect(&self, a: &Entity, b: &Entity) -> bool;
}

/// Orders a pair so the entity of kind `first` comes first
fn pick<'a>(
    a: &'a Entity,
    b: &'a Entity,
    first: ObjectKind,
    second: ObjectKind,
) -> Option<(&'a Entity, &'a Entity)> {
    if a.kind() == first && b.kind() == second {
        Some((a, b))
    } else if b.kind() == first && a.kind() == second {
        Some((b, a))
    } else {
        None
    }
}

/// A bullet hitting an enemy tank damages it and dies
pub struct BulletTankDetector;

impl CollisionDetector for BulletTankDetector {
    fn name(&self) -> &'static str {
        "bullet-tank"
    }

    fn detect(&self, a: &Entity, b: &Entity) -> bool {
        let Some((bullet, tank)) = pick(a, b, ObjectKind::Bullet, ObjectKind::Tank) else {
            return false;
        };

        let mut bullet_state = bullet.lock();
        let mut tank_state = tank.lock();
        if !bullet_state.is_alive() || !tank_state.is_alive() {
            return false;
        }

        let (fired_by_tank, damage) = match bullet_state.body() {
            ObjectBody::Bullet {
                owner_id, damage, ..
            } => (owner_id == tank.id(), *damage),
            _ => return false,
        };
        if fired_by_tank || bullet.group() == tank.group() {
            return false;
        }
        if !bullet_state.location().intersects(&tank_state.location()) {
            return false;
        }

        let killed = tank_state.damage(damage);
        bullet_state.die();
        debug!(
            "Bullet {} hit tank {} for {} (health {}{})",
            bullet.id(),
            tank.id(),
            damage,
            tank_state.health(),
            if killed { ", destroyed" } else { "" }
        );
        true
    }
}

/// Overlapping tanks are both pushed back to where they were
pub struct TankTankDetector;

impl CollisionDetector for TankTankDetector {
    fn name(&self) -> &'static str {
        "tank-tank"
    }

    fn detect(&self, a: &Entity, b: &Entity) -> bool {
        if a.kind() != ObjectKind::Tank || b.kind() != ObjectKind::Tank {
            return false;
        }

        let mut a_state = a.lock();
        let mut b_state = b.lock();
        if !a_state.is_alive() || !b_state.is_alive() {
            return false;
        }
        if !a_state.location().intersects(&b_state.location()) {
            return false;
        }

        a_state.back();
        b_state.back();
        debug!("Tanks {} and {} collided", a.id(), b.id());
        true
    }
}

/// Bullets stop at walls
pub struct BulletWallDetector;

impl CollisionDetector for BulletWallDetector {
    fn name(&self) -> &'static str {
        "bullet-wall"
    }

    fn detect(&self, a: &Entity, b: &Entity) -> bool {
        let Some((bullet, wall)) = pick(a, b, ObjectKind::Bullet, ObjectKind::Wall) else {
            return false;
        };

        let mut bullet_state = bullet.lock();
        let wall_state = wall.lock();
        if !bullet_state.is_alive() || !wall_state.is_alive() {
            return false;
        }
        if !bullet_state.location().intersects(&wall_state.location()) {
            return false;
        }

        bullet_state.die();
        true
    }
}

/// Tanks cannot drive into walls
pub struct TankWallDetector;

impl CollisionDetector for TankWallDetector {
    fn name(&self) -> &'static str {
        "tank-wall"
    }

    fn detect(&self, a: &Entity, b: &Entity) -> bool {
        let Some((tank, wall)) = pick(a, b, ObjectKind::Tank, ObjectKind::Wall) else {
            return false;
        };

        let mut tank_state = tank.lock();
        let wall_state = wall.lock();
        if !tank_state.is_alive() || !wall_state.is_alive() {
            return false;
        }
        if !tank_state.location().intersects(&wall_state.location()) {
            return false;
        }

        tank_state.back();
        true
    }
}

#[derive(Default)]
pub struct CollisionChain {
    detectors: Vec<Box<dyn CollisionDetector>>,
}

impl CollisionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bullet–tank first, then tank–tank
    pub fn standard() -> Self {
        let mut chain = Self::new();
        chain.register(Box::new(BulletTankDetector));
        chain.register(Box::new(TankTankDetector));
        chain
    }

    /// The standard chain followed by the optional wall detectors that are
    /// switched on in `config`
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut chain = Self::standard();
        if config.bullets_hit_walls {
            chain.register(Box::new(BulletWallDetector));
        }
        if config.walls_block_tanks {
            chain.register(Box::new(TankWallDetector));
        }
        chain
    }

    /// Appends a detector. Returns false if one with the same name exists.
    pub fn register(&mut self, detector: Box<dyn CollisionDetector>) -> bool {
        if self.detectors.iter().any(|d| d.name() == detector.name()) {
            warn!("Collision detector {} already registered", detector.name());
            return false;
        }
        self.detectors.push(detector);
        true
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Runs the detectors for one pair until one handles it
    pub fn detect(&self, a: &Entity, b: &Entity) -> bool {
        if a.id() == b.id() {
            return false;
        }
        self.detectors.iter().any(|detector| detector.detect(a, b))
    }

    /// Checks every unordered pair once. Returns how many pairs collided.
    pub fn resolve_all(&self, entities: &[Arc<Entity>]) -> usize {
        let mut handled = 0;
        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                if self.detect(a, b) {
                    handled += 1;
                }
            }
        }
        handled
    }
}
