//! Dispatch of client messages
//!
//! Login, move and fire mutate the world as soon as they arrive; they are not
//! queued for the next tick. Resulting position changes reach other players
//! through the tick's status deltas.

use crate::client_manager::{ClientManager, ConnectionId};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::GameState;
use crate::session::SessionDirectory;
use log::{debug, info, warn};
use shared::{
    ClientFire, ClientLogin, ClientMove, CodecError, Frame, GameInitialization, Message, NewObject,
};
use std::sync::Arc;

pub struct GameService {
    config: Arc<ServerConfig>,
    game: Arc<GameState>,
    clients: Arc<ClientManager>,
    sessions: Arc<SessionDirectory>,
}

impl GameService {
    pub fn new(
        config: Arc<ServerConfig>,
        game: Arc<GameState>,
        clients: Arc<ClientManager>,
        sessions: Arc<SessionDirectory>,
    ) -> Self {
        Self {
            config,
            game,
            clients,
            sessions,
        }
    }

    pub fn game(&self) -> &Arc<GameState> {
        &self.game
    }

    pub fn clients(&self) -> &Arc<ClientManager> {
        &self.clients
    }

    pub fn sessions(&self) -> &Arc<SessionDirectory> {
        &self.sessions
    }

    /// Decodes and handles one inbound frame. A frame that cannot be decoded
    /// is dropped; the connection stays open.
    pub fn handle_frame(&self, connection: ConnectionId, frame: &Frame) {
        match Message::from_frame(frame) {
            Ok(message) => self.handle_message(connection, message),
            Err(CodecError::UnknownType(tag)) => {
                warn!(
                    "Ignoring unknown message type {} from client {}",
                    tag, connection
                );
            }
            Err(e) => {
                warn!("Dropping undecodable frame from client {}: {}", connection, e);
            }
        }
    }

    pub fn handle_message(&self, connection: ConnectionId, message: Message) {
        debug!("Client {} sent {:?}", connection, message.message_type());

        let result = match message {
            Message::ClientLogin(login) => self.login(connection, login),
            Message::ClientMove(command) => self.move_tank(connection, command),
            Message::ClientFire(command) => self.fire(connection, command),
            other => {
                warn!(
                    "Client {} sent server-only message {:?}",
                    connection,
                    other.message_type()
                );
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Ignored command from client {}: {}", connection, e);
        }
    }

    /// Admits a player: binds the connection, spawns a tank, sends the full
    /// world to the player and announces the tank to everyone else
    pub fn login(&self, connection: ConnectionId, login: ClientLogin) -> Result<(), ServerError> {
        let rejection = if login.username.is_empty() {
            Some("username must not be empty")
        } else if login.password != self.config.password {
            Some("invalid credentials")
        } else {
            None
        };
        if let Some(reason) = rejection {
            let response = GameInitialization::rejected(reason);
            self.clients
                .send_message(connection, &Message::Initialization(response));
            return Err(ServerError::LoginRejected {
                username: login.username,
                reason: reason.to_string(),
            });
        }

        let user_id = self.sessions.get_or_create_user_id(&login.username);
        self.sessions.bind_connection(connection, user_id.clone());

        let tank = self
            .game
            .create_tank(&login.username, user_id.clone(), |object| {
                let announcement = NewObject {
                    owner_user_id: Some(user_id.clone()),
                    object: object.clone(),
                };
                self.clients
                    .broadcast_message_except(connection, &Message::NewObject(announcement));
            });
        self.sessions.bind_tank(user_id.clone(), tank.id().clone());

        let response =
            GameInitialization::accepted(user_id, tank.snapshot(), self.game.snapshot());
        self.clients
            .send_message(connection, &Message::Initialization(response));

        info!(
            "{} logged in on client {} with tank {}",
            login.username,
            connection,
            tank.id()
        );
        Ok(())
    }

    pub fn move_tank(
        &self,
        connection: ConnectionId,
        command: ClientMove,
    ) -> Result<(), ServerError> {
        self.sessions
            .require_authenticated(connection, &command.user_id)?;
        let tank = self.sessions.tank_of(&command.user_id, &self.game)?;

        if !tank.move_tank(command.direction) {
            debug!("Tank {} cannot move", tank.id());
        }
        Ok(())
    }

    pub fn fire(&self, connection: ConnectionId, command: ClientFire) -> Result<(), ServerError> {
        self.sessions
            .require_authenticated(connection, &command.user_id)?;
        let tank = self.sessions.tank_of(&command.user_id, &self.game)?;

        if !tank.is_alive() {
            debug!("Dead tank {} cannot fire", tank.id());
            return Ok(());
        }

        self.game.create_bullets(&tank, |object| {
            let announcement = NewObject {
                owner_user_id: Some(command.user_id.clone()),
                object: object.clone(),
            };
            self.clients
                .broadcast_message(&Message::NewObject(announcement));
        });
        Ok(())
    }

    /// Forgets a closed connection. Its tank stays in the world.
    pub fn disconnect(&self, connection: ConnectionId) {
        self.clients.remove_client(connection);
        if let Some(user_id) = self.sessions.unbind_connection(connection) {
            info!("User {} left (client {})", user_id, connection);
        }
    }
}
