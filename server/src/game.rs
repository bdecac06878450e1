//! Shared entity directory and object factories

use crate::config::ServerConfig;
use crate::entity::Entity;
use dashmap::DashMap;
use log::{debug, warn};
use rand::Rng;
use shared::{Direction, GameObject, ObjectId, Rect, UserId};
use std::sync::Arc;

/// Walls registered when the server starts
pub const DEFAULT_WALLS: [Rect; 4] = [
    Rect::new(150, 150, 200, 50),
    Rect::new(550, 150, 200, 50),
    Rect::new(300, 300, 50, 200),
    Rect::new(550, 300, 50, 200),
];

/// Where a tank spawns when the spot is free
pub const SPAWN_POINT: (i32, i32) = (50, 50);

const SPAWN_ATTEMPTS: usize = 64;

/// The authoritative id → object directory
///
/// Safe for concurrent insert, remove and iteration from connection tasks and
/// the tick task. Iteration goes through [`GameState::entities`], which copies
/// the `Arc`s out so no shard lock is held while entity locks are taken.
pub struct GameState {
    objects: DashMap<ObjectId, Arc<Entity>>,
    config: Arc<ServerConfig>,
}

impl GameState {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            objects: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Brings `entity` to life and makes it visible to everyone else
    pub fn register(&self, entity: Entity) -> Arc<Entity> {
        self.register_with(entity, |_| {})
    }

    /// Like [`GameState::register`], but hands the first snapshot to
    /// `announce` while the entity is still locked. The tick has to lock an
    /// entity before it can kill or sweep it, so nothing about the entity
    /// goes out ahead of the announcement.
    ///
    /// `announce` must not lock other entities.
    pub fn register_with<F>(&self, entity: Entity, announce: F) -> Arc<Entity>
    where
        F: FnOnce(&GameObject),
    {
        let entity = Arc::new(entity);
        {
            let mut state = entity.lock();
            state.arise();
            self.objects.insert(entity.id().clone(), Arc::clone(&entity));
            announce(&entity.capture(&state));
        }
        debug!("Registered {} {}", entity.kind(), entity.id());
        entity
    }

    pub fn get(&self, id: &ObjectId) -> Option<Arc<Entity>> {
        self.objects.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes an object. Only the first call for a given id returns it.
    pub fn remove(&self, id: &ObjectId) -> Option<Arc<Entity>> {
        self.objects.remove(id).map(|(_, entity)| entity)
    }

    pub fn entities(&self) -> Vec<Arc<Entity>> {
        self.objects
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<GameObject> {
        self.entities().iter().map(|entity| entity.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn create_wall(&self, location: Rect) -> Arc<Entity> {
        self.register(Entity::wall(location, self.config.world_bounds()))
    }

    pub fn spawn_default_walls(&self) -> Vec<Arc<Entity>> {
        DEFAULT_WALLS
            .iter()
            .map(|rect| self.create_wall(*rect))
            .collect()
    }

    /// Creates a tank for `username` at the spawn point, or at a random free
    /// spot when the spawn point is taken
    pub fn create_tank<F>(&self, username: &str, user_id: UserId, announce: F) -> Arc<Entity>
    where
        F: FnOnce(&GameObject),
    {
        let location = self.free_spawn_location(self.config.tank_size);
        let tank = Entity::tank(
            username,
            user_id,
            location,
            self.config.tank_health,
            self.config.tank_speed,
            self.config.world_bounds(),
        );
        self.register_with(tank, announce)
    }

    fn free_spawn_location(&self, size: i32) -> Rect {
        let bounds = self.config.world_bounds();
        let mut candidate = Rect::new(SPAWN_POINT.0, SPAWN_POINT.1, size, size);
        let mut rng = rand::thread_rng();

        for _ in 0..SPAWN_ATTEMPTS {
            if !self.is_occupied(&candidate) {
                return candidate;
            }
            let x = rng.gen_range(bounds.x..=(bounds.right() - size).max(bounds.x));
            let y = rng.gen_range(bounds.y..=(bounds.bottom() - size).max(bounds.y));
            candidate = Rect::new(x, y, size, size);
        }

        warn!(
            "No free spawn spot after {} attempts, spawning at ({}, {})",
            SPAWN_ATTEMPTS, candidate.x, candidate.y
        );
        candidate
    }

    fn is_occupied(&self, rect: &Rect) -> bool {
        self.entities().iter().any(|entity| {
            let state = entity.lock();
            state.is_alive() && state.location().intersects(rect)
        })
    }

    /// Fires from `tank` according to the configured strategy. `announce`
    /// runs once per bullet.
    pub fn create_bullets<F>(&self, tank: &Entity, mut announce: F) -> Vec<Arc<Entity>>
    where
        F: FnMut(&GameObject),
    {
        let (origin, facing) = {
            let state = tank.lock();
            (state.location(), state.direction().unwrap_or(Direction::Right))
        };

        self.config
            .fire_strategy
            .directions(facing)
            .into_iter()
            .map(|direction| {
                let location = bullet_spawn(&origin, direction, self.config.bullet_size);
                let bullet = Entity::bullet(
                    tank,
                    location,
                    direction,
                    self.config.bullet_damage,
                    self.config.bullet_speed,
                    self.config.world_bounds(),
                );
                self.register_with(bullet, &mut announce)
            })
            .collect()
    }

    pub fn create_explosion<F>(&self, owner: &Entity, announce: F) -> Arc<Entity>
    where
        F: FnOnce(&GameObject),
    {
        self.register_with(Entity::explosion(owner, self.config.world_bounds()), announce)
    }
}

/// Bullet rectangle centred on the midpoint of the tank's edge facing
/// `direction`
pub fn bullet_spawn(tank: &Rect, direction: Direction, size: i32) -> Rect {
    let (cx, cy) = match direction {
        Direction::Up => (tank.x + tank.width / 2, tank.y),
        Direction::Down => (tank.x + tank.width / 2, tank.bottom()),
        Direction::Left => (tank.x, tank.y + tank.height / 2),
        Direction::Right => (tank.right(), tank.y + tank.height / 2),
    };
    Rect::new(cx - size / 2, cy - size / 2, size, size)
}
