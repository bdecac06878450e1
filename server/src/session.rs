//! Identity bindings between usernames, user ids, tanks and connections

use crate::client_manager::ConnectionId;
use crate::entity::Entity;
use crate::error::ServerError;
use crate::game::GameState;
use dashmap::DashMap;
use log::debug;
use shared::{ObjectId, ObjectKind, UserId};
use std::sync::Arc;

#[derive(Default)]
pub struct SessionDirectory {
    users: DashMap<String, UserId>,
    connections: DashMap<ConnectionId, UserId>,
    tanks: DashMap<UserId, ObjectId>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `username`, generating it on first use. Concurrent
    /// first calls converge on a single id.
    pub fn get_or_create_user_id(&self, username: &str) -> UserId {
        self.users
            .entry(username.to_string())
            .or_insert_with(UserId::generate)
            .value()
            .clone()
    }

    pub fn user_id(&self, username: &str) -> Option<UserId> {
        self.users.get(username).map(|entry| entry.value().clone())
    }

    /// Records that `connection` now speaks for `user_id`
    pub fn bind_connection(&self, connection: ConnectionId, user_id: UserId) {
        debug!("Connection {} bound to user {}", connection, user_id);
        self.connections.insert(connection, user_id);
    }

    pub fn connection_user(&self, connection: ConnectionId) -> Option<UserId> {
        self.connections
            .get(&connection)
            .map(|entry| entry.value().clone())
    }

    /// Points `user_id` at its current tank. A later login replaces the
    /// previous binding.
    pub fn bind_tank(&self, user_id: UserId, tank_id: ObjectId) {
        self.tanks.insert(user_id, tank_id);
    }

    /// Accepts only if `connection` is bound to exactly `claimed`
    pub fn require_authenticated(
        &self,
        connection: ConnectionId,
        claimed: &UserId,
    ) -> Result<(), ServerError> {
        match self.connections.get(&connection) {
            Some(bound) if bound.value() == claimed => Ok(()),
            _ => Err(ServerError::Unauthorized {
                connection,
                claimed: claimed.clone(),
            }),
        }
    }

    /// Resolves the player's current tank through user id → tank id → object
    pub fn tank_of(
        &self,
        user_id: &UserId,
        game: &GameState,
    ) -> Result<Arc<Entity>, ServerError> {
        let tank_id = self
            .tanks
            .get(user_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServerError::UnknownUser(user_id.clone()))?;

        let entity = game
            .get(&tank_id)
            .ok_or_else(|| ServerError::TankNotFound(tank_id.clone()))?;

        if entity.kind() != ObjectKind::Tank {
            return Err(ServerError::NotATank(tank_id));
        }
        Ok(entity)
    }

    /// Forgets which user a closed connection spoke for
    pub fn unbind_connection(&self, connection: ConnectionId) -> Option<UserId> {
        self.connections.remove(&connection).map(|(_, user_id)| user_id)
    }
}
