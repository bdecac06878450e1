//! Live game objects and their lifecycle
//!
//! Every object in the world is an [`Entity`]: immutable identity (id, kind,
//! group, world bounds) plus mutable state behind its own lock. Connection
//! tasks lock one entity at a time; only the tick task ever holds two locks,
//! inside a collision detector.

use parking_lot::{Mutex, MutexGuard};
use shared::model::INDESTRUCTIBLE_HEALTH;
use shared::{
    Direction, GameObject, Group, ObjectBody, ObjectId, ObjectKind, ObjectStatus, Rect, UserId,
};

/// `Created -> Alive -> Dead`. Never goes backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Created,
    Alive,
    Dead,
}

/// Mutable part of an entity, only reachable through [`Entity::lock`]
#[derive(Debug)]
pub struct EntityState {
    location: Rect,
    previous: Rect,
    direction: Option<Direction>,
    health: i32,
    life: LifeState,
    body: ObjectBody,
}

impl EntityState {
    fn new(location: Rect, direction: Option<Direction>, health: i32, body: ObjectBody) -> Self {
        Self {
            location,
            previous: location,
            direction,
            health,
            life: LifeState::Created,
            body,
        }
    }

    pub fn location(&self) -> Rect {
        self.location
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn life(&self) -> LifeState {
        self.life
    }

    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    pub fn body(&self) -> &ObjectBody {
        &self.body
    }

    /// Brings a freshly created entity to life. No-op afterwards.
    pub fn arise(&mut self) -> bool {
        if self.life == LifeState::Created {
            self.life = LifeState::Alive;
            true
        } else {
            false
        }
    }

    /// Marks the entity dead. Returns true only for the call that killed it.
    pub fn die(&mut self) -> bool {
        let was_alive = self.is_alive();
        self.life = LifeState::Dead;
        was_alive
    }

    /// Restores the rectangle saved by the last move
    pub fn back(&mut self) {
        self.location = self.previous;
    }

    /// Subtracts `amount` from a tank's health, floored at zero. Returns true
    /// if this hit killed it. Every other kind is indestructible.
    pub fn damage(&mut self, amount: i32) -> bool {
        if !self.is_alive() || self.body.kind() != ObjectKind::Tank {
            return false;
        }
        self.health = self.health.saturating_sub(amount).max(0);
        self.health == 0 && self.die()
    }

    fn move_by(&mut self, direction: Direction, speed: i32, bounds: &Rect) {
        let (dx, dy) = direction.delta();
        self.previous = self.location;
        self.direction = Some(direction);
        self.location = self
            .location
            .translated(dx * speed, dy * speed)
            .clamped_within(bounds);
    }
}

#[derive(Debug)]
pub struct Entity {
    id: ObjectId,
    kind: ObjectKind,
    group: Group,
    bounds: Rect,
    state: Mutex<EntityState>,
}

impl Entity {
    fn new(group: Group, bounds: Rect, state: EntityState) -> Self {
        Self {
            id: ObjectId::generate(),
            kind: state.body.kind(),
            group,
            bounds,
            state: Mutex::new(state),
        }
    }

    pub fn tank(
        owner_username: &str,
        owner_user_id: UserId,
        location: Rect,
        health: i32,
        speed: i32,
        bounds: Rect,
    ) -> Self {
        let body = ObjectBody::Tank {
            owner_username: owner_username.to_string(),
            owner_user_id,
            speed,
        };
        Self::new(
            Group::player(owner_username),
            bounds,
            EntityState::new(location, Some(Direction::Right), health, body),
        )
    }

    /// A bullet joins its owner's group so allies are never hit
    pub fn bullet(
        owner: &Entity,
        location: Rect,
        direction: Direction,
        damage: i32,
        speed: i32,
        bounds: Rect,
    ) -> Self {
        let body = ObjectBody::Bullet {
            owner_id: owner.id.clone(),
            damage,
            speed,
        };
        Self::new(
            owner.group.clone(),
            bounds,
            EntityState::new(location, Some(direction), INDESTRUCTIBLE_HEALTH, body),
        )
    }

    pub fn wall(location: Rect, bounds: Rect) -> Self {
        Self::new(
            Group::system(),
            bounds,
            EntityState::new(location, None, INDESTRUCTIBLE_HEALTH, ObjectBody::Wall),
        )
    }

    pub fn explosion(owner: &Entity, bounds: Rect) -> Self {
        let location = owner.location();
        let body = ObjectBody::Explosion {
            owner_id: owner.id.clone(),
            step: 0,
        };
        Self::new(
            Group::system(),
            bounds,
            EntityState::new(location, None, INDESTRUCTIBLE_HEALTH, body),
        )
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn lock(&self) -> MutexGuard<'_, EntityState> {
        self.state.lock()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    pub fn arise(&self) -> bool {
        self.lock().arise()
    }

    pub fn die(&self) -> bool {
        self.lock().die()
    }

    pub fn is_alive(&self) -> bool {
        self.lock().is_alive()
    }

    pub fn location(&self) -> Rect {
        self.lock().location
    }

    pub fn direction(&self) -> Option<Direction> {
        self.lock().direction
    }

    pub fn health(&self) -> i32 {
        self.lock().health
    }

    pub fn damage(&self, amount: i32) -> bool {
        self.lock().damage(amount)
    }

    pub fn back(&self) {
        self.lock().back()
    }

    /// Turns a live tank towards `direction` and advances it by its speed,
    /// keeping it inside the world. Returns false for anything else.
    pub fn move_tank(&self, direction: Direction) -> bool {
        let mut state = self.lock();
        let speed = match state.body {
            ObjectBody::Tank { speed, .. } => speed,
            _ => return false,
        };
        if !state.is_alive() {
            return false;
        }
        state.move_by(direction, speed, &self.bounds);
        true
    }

    /// Advances a live bullet one step. A bullet with any part outside the
    /// world dies. Returns whether it is still alive.
    pub fn fly(&self) -> bool {
        let mut state = self.lock();
        let speed = match state.body {
            ObjectBody::Bullet { speed, .. } => speed,
            _ => return state.is_alive(),
        };
        if !state.is_alive() {
            return false;
        }
        let Some(direction) = state.direction else {
            return true;
        };

        let (dx, dy) = direction.delta();
        state.previous = state.location;
        state.location = state.location.translated(dx * speed, dy * speed);

        if !self.bounds.contains(&state.location) {
            state.die();
            return false;
        }
        true
    }

    /// Steps an explosion's animation; it dies once the step count exceeds
    /// `frames`
    pub fn advance_explosion(&self, frames: u32) {
        let mut state = self.lock();
        if !state.is_alive() {
            return;
        }
        let expired = match &mut state.body {
            ObjectBody::Explosion { step, .. } => {
                *step += 1;
                *step > frames
            }
            _ => false,
        };
        if expired {
            state.die();
        }
    }

    pub fn status(&self) -> ObjectStatus {
        let state = self.lock();
        ObjectStatus {
            id: self.id.clone(),
            direction: state.direction,
            x: state.location.x,
            y: state.location.y,
            health: state.health,
        }
    }

    pub fn snapshot(&self) -> GameObject {
        self.capture(&self.lock())
    }

    /// Snapshot from a guard the caller already holds
    pub fn capture(&self, state: &EntityState) -> GameObject {
        GameObject {
            id: self.id.clone(),
            group: self.group.clone(),
            location: state.location,
            direction: state.direction,
            health: state.health,
            alive: state.is_alive(),
            body: state.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn bounds() -> Rect {
        shared::world_bounds(800, 600)
    }

    fn tank_at(x: i32, y: i32) -> Entity {
        let tank = Entity::tank(
            "c1",
            UserId::from("user-1"),
            Rect::new(x, y, 50, 50),
            100,
            5,
            bounds(),
        );
        tank.arise();
        tank
    }

    #[test]
    fn test_lifecycle_transitions_once() {
        let wall = Entity::wall(Rect::new(150, 150, 200, 50), bounds());
        assert_eq!(wall.lock().life(), LifeState::Created);
        assert!(!wall.is_alive());

        assert!(wall.arise());
        assert!(!wall.arise());
        assert!(wall.is_alive());

        assert!(wall.die());
        assert!(!wall.die());
        assert!(!wall.arise());
        assert_eq!(wall.lock().life(), LifeState::Dead);
    }

    #[test]
    fn test_move_tank_turns_and_advances() {
        let tank = tank_at(100, 100);
        assert!(tank.move_tank(Direction::Down));

        assert_eq!(tank.location(), Rect::new(100, 105, 50, 50));
        assert_eq!(tank.direction(), Some(Direction::Down));

        tank.back();
        assert_eq!(tank.location(), Rect::new(100, 100, 50, 50));
    }

    #[test]
    fn test_move_tank_clamped_to_bounds() {
        let tank = tank_at(3, 26);
        tank.move_tank(Direction::Left);
        assert_eq!(tank.location().x, 2);
        tank.move_tank(Direction::Up);
        assert_eq!(tank.location().y, 25);
    }

    #[test]
    fn test_move_ignores_non_tanks_and_dead_tanks() {
        let wall = Entity::wall(Rect::new(150, 150, 200, 50), bounds());
        wall.arise();
        assert!(!wall.move_tank(Direction::Up));

        let tank = tank_at(100, 100);
        tank.die();
        assert!(!tank.move_tank(Direction::Up));
        assert_eq!(tank.location(), Rect::new(100, 100, 50, 50));
    }

    #[test]
    fn test_bullet_inherits_owner_group() {
        let tank = tank_at(100, 100);
        let bullet = Entity::bullet(
            &tank,
            Rect::new(150, 115, 20, 20),
            Direction::Right,
            10,
            10,
            bounds(),
        );
        assert_eq!(bullet.group(), tank.group());
        match bullet.snapshot().body {
            ObjectBody::Bullet { owner_id, damage, speed } => {
                assert_eq!(&owner_id, tank.id());
                assert_eq!(damage, 10);
                assert_eq!(speed, 10);
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_bullet_flies_and_dies_outside() {
        let tank = tank_at(700, 100);
        let bullet = Entity::bullet(
            &tank,
            Rect::new(770, 115, 20, 20),
            Direction::Right,
            10,
            10,
            bounds(),
        );
        bullet.arise();

        assert!(!bullet.fly());
        assert!(!bullet.is_alive());
        assert!(!bullet.fly());
    }

    #[test]
    fn test_bullet_flies_inside() {
        let tank = tank_at(100, 100);
        let bullet = Entity::bullet(
            &tank,
            Rect::new(140, 115, 20, 20),
            Direction::Right,
            10,
            10,
            bounds(),
        );
        bullet.arise();

        assert!(bullet.fly());
        assert_eq!(bullet.location(), Rect::new(150, 115, 20, 20));
    }

    #[test]
    fn test_damage_floors_at_zero_and_kills_once() {
        let tank = tank_at(100, 100);
        assert!(!tank.damage(30));
        assert_eq!(tank.health(), 70);

        assert!(tank.damage(500));
        assert_eq!(tank.health(), 0);
        assert!(!tank.is_alive());

        assert!(!tank.damage(10));
        assert_eq!(tank.health(), 0);
    }

    #[test]
    fn test_walls_ignore_damage() {
        let wall = Entity::wall(Rect::new(150, 150, 200, 50), bounds());
        wall.arise();
        assert!(!wall.damage(1_000));
        assert!(wall.is_alive());
        assert_eq!(wall.health(), INDESTRUCTIBLE_HEALTH);
    }

    #[test]
    fn test_tank_health_at_indestructible_value_still_takes_damage() {
        let tank = Entity::tank(
            "c1",
            UserId::from("user-1"),
            Rect::new(100, 100, 50, 50),
            INDESTRUCTIBLE_HEALTH,
            5,
            bounds(),
        );
        tank.arise();

        assert!(!tank.damage(10));
        assert_eq!(tank.health(), INDESTRUCTIBLE_HEALTH - 10);
    }

    #[test]
    fn test_bullets_and_explosions_ignore_damage() {
        let tank = tank_at(100, 100);
        let bullet = Entity::bullet(
            &tank,
            Rect::new(150, 115, 20, 20),
            Direction::Right,
            10,
            10,
            bounds(),
        );
        bullet.arise();
        let explosion = Entity::explosion(&tank, bounds());
        explosion.arise();

        for entity in [&bullet, &explosion] {
            assert!(!entity.damage(i32::MAX));
            assert!(entity.is_alive());
            assert_eq!(entity.health(), INDESTRUCTIBLE_HEALTH);
        }
    }

    #[test]
    fn test_explosion_expires_after_frames() {
        let tank = tank_at(100, 100);
        let explosion = Entity::explosion(&tank, bounds());
        explosion.arise();
        assert_eq!(explosion.location(), tank.location());

        for _ in 0..16 {
            explosion.advance_explosion(16);
        }
        assert!(explosion.is_alive());

        explosion.advance_explosion(16);
        assert!(!explosion.is_alive());
    }

    #[test]
    fn test_status_and_snapshot_agree() {
        let tank = tank_at(100, 100);
        let snapshot = tank.snapshot();
        assert_eq!(snapshot.status(), tank.status());
        assert!(snapshot.alive);
        assert_eq!(snapshot.kind(), ObjectKind::Tank);
    }

    #[test]
    fn test_concurrent_damage_is_not_lost() {
        let tank = Arc::new(Entity::tank(
            "c1",
            UserId::from("user-1"),
            Rect::new(100, 100, 50, 50),
            10_000,
            5,
            bounds(),
        ));
        tank.arise();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tank = Arc::clone(&tank);
                thread::spawn(move || {
                    for _ in 0..100 {
                        tank.damage(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tank.health(), 10_000 - 800);
    }
}
