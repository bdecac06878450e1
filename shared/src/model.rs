//! Wire-level description of game objects
//!
//! The server keeps its live entities behind per-entity locks; whenever an
//! entity has to cross the network it is captured into a [`GameObject`]
//! snapshot. [`ObjectStatus`] is the smaller record used for delta updates.

use crate::geometry::{Direction, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Health reported for objects that cannot be damaged
pub const INDESTRUCTIBLE_HEALTH: i32 = i32::MAX;

/// Opaque, globally unique object identifier. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identifier of a player account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Team tag. Objects are allies iff their groups are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group(String);

impl Group {
    pub const SYSTEM_CODE: &'static str = "system";

    /// Group of walls, explosions and anything else the server owns
    pub fn system() -> Self {
        Self(Self::SYSTEM_CODE.to_string())
    }

    /// Each connected player forms a group keyed by username
    pub fn player(username: &str) -> Self {
        Self(format!("player:{}", username))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

/// Concrete kind of a game object; also the type name sent in `ObjectDie`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Tank,
    Bullet,
    Wall,
    Explosion,
}

impl ObjectKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ObjectKind::Tank => "Tank",
            ObjectKind::Bullet => "Bullet",
            ObjectKind::Wall => "Wall",
            ObjectKind::Explosion => "Explosion",
        }
    }

    pub fn is_movable(self) -> bool {
        matches!(self, ObjectKind::Tank | ObjectKind::Bullet)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Kind-specific attributes of a game object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectBody {
    Tank {
        owner_username: String,
        owner_user_id: UserId,
        speed: i32,
    },
    Bullet {
        owner_id: ObjectId,
        damage: i32,
        speed: i32,
    },
    Wall,
    Explosion {
        owner_id: ObjectId,
        step: u32,
    },
}

impl ObjectBody {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectBody::Tank { .. } => ObjectKind::Tank,
            ObjectBody::Bullet { .. } => ObjectKind::Bullet,
            ObjectBody::Wall => ObjectKind::Wall,
            ObjectBody::Explosion { .. } => ObjectKind::Explosion,
        }
    }
}

/// Point-in-time snapshot of a game object as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub group: Group,
    pub location: Rect,
    pub direction: Option<Direction>,
    pub health: i32,
    pub alive: bool,
    pub body: ObjectBody,
}

impl GameObject {
    pub fn kind(&self) -> ObjectKind {
        self.body.kind()
    }

    pub fn status(&self) -> ObjectStatus {
        ObjectStatus {
            id: self.id.clone(),
            direction: self.direction,
            x: self.location.x,
            y: self.location.y,
            health: self.health,
        }
    }

    /// Applies a status delta received from the server
    pub fn apply_status(&mut self, status: &ObjectStatus) {
        if status.direction.is_some() {
            self.direction = status.direction;
        }
        self.location.x = status.x;
        self.location.y = status.y;
        self.health = status.health;
    }
}

/// Minimal diffable record: position, direction and health of one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStatus {
    pub id: ObjectId,
    pub direction: Option<Direction>,
    pub x: i32,
    pub y: i32,
    pub health: i32,
}
