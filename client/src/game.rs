//! Local mirror of the server's world
//!
//! The client never simulates anything itself. It applies the server's
//! messages to a map of object snapshots and keeps track of its own tank.

use log::{debug, info};
use shared::{
    GameInitialization, GameObject, GameSave, Message, ObjectId, ObjectKind, SaveError, SaveStore,
    UserId,
};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ClientGameState {
    user_id: Option<UserId>,
    tank_id: Option<ObjectId>,
    objects: HashMap<ObjectId, GameObject>,
    game_over: bool,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a mirror from a saved game
    pub fn restore(save: GameSave) -> Self {
        let mut objects = save.objects;
        objects.insert(save.tank.id.clone(), save.tank.clone());
        let owner = match &save.tank.body {
            shared::ObjectBody::Tank { owner_user_id, .. } => Some(owner_user_id.clone()),
            _ => None,
        };
        Self {
            user_id: owner,
            tank_id: Some(save.tank.id),
            objects,
            game_over: false,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn tank_id(&self) -> Option<&ObjectId> {
        self.tank_id.as_ref()
    }

    pub fn tank(&self) -> Option<&GameObject> {
        self.tank_id.as_ref().and_then(|id| self.objects.get(id))
    }

    pub fn get(&self, id: &ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    pub fn objects(&self) -> &HashMap<ObjectId, GameObject> {
        &self.objects
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|o| o.kind() == kind).count()
    }

    /// True once the player's own tank has been destroyed
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Applies one server message. Returns false for messages the mirror
    /// does not track.
    pub fn apply(&mut self, message: &Message) -> bool {
        match message {
            Message::Initialization(init) => {
                self.initialize(init);
                true
            }
            Message::NewObject(new) => {
                self.objects.insert(new.object.id.clone(), new.object.clone());
                true
            }
            Message::ObjectDie(die) => {
                self.objects.remove(&die.id);
                if self.tank_id.as_ref() == Some(&die.id) {
                    info!("Our tank {} was destroyed", die.id);
                    self.game_over = true;
                }
                true
            }
            Message::StatusUpdate(update) => {
                for status in &update.list {
                    match self.objects.get_mut(&status.id) {
                        Some(object) => object.apply_status(status),
                        None => debug!("Status for unknown object {}", status.id),
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn initialize(&mut self, init: &GameInitialization) {
        if !init.success {
            return;
        }
        self.user_id = init.user_id.clone();
        self.tank_id = init.tank.as_ref().map(|tank| tank.id.clone());
        self.game_over = false;
        self.objects = init
            .objects
            .iter()
            .map(|object| (object.id.clone(), object.clone()))
            .collect();
        if let Some(tank) = &init.tank {
            self.objects.insert(tank.id.clone(), tank.clone());
        }
    }

    /// Writes the current view to `store`. Returns false when there is no
    /// tank to save yet.
    pub fn save<S: SaveStore>(&self, store: &S) -> Result<bool, SaveError> {
        match self.tank() {
            Some(tank) => {
                store.save(tank, &self.objects)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
