//! Save/load of a player's view of the world
//!
//! A [`SaveStore`] persists the player's own tank together with every object
//! it knows about. [`FileSaveStore`] keeps one bincode-encoded snapshot per
//! file; each save replaces the previous one.

use crate::error::{CodecError, SaveError};
use crate::model::{GameObject, ObjectId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Everything needed to restore a saved game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSave {
    pub tank: GameObject,
    pub objects: HashMap<ObjectId, GameObject>,
}

pub trait SaveStore {
    fn save(&self, tank: &GameObject, objects: &HashMap<ObjectId, GameObject>)
        -> Result<(), SaveError>;

    fn load(&self) -> Result<GameSave, SaveError>;
}

pub struct FileSaveStore {
    path: PathBuf,
}

impl FileSaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileSaveStore {
    fn save(
        &self,
        tank: &GameObject,
        objects: &HashMap<ObjectId, GameObject>,
    ) -> Result<(), SaveError> {
        let save = GameSave {
            tank: tank.clone(),
            objects: objects.clone(),
        };
        let bytes = bincode::serialize(&save).map_err(CodecError::from)?;

        // Staged next to the target, then renamed into place
        let staging = self.path.with_extension("partial");
        fs::write(&staging, &bytes)?;
        fs::rename(&staging, &self.path)?;

        debug!(
            "Saved {} objects ({} bytes) to {}",
            objects.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load(&self) -> Result<GameSave, SaveError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SaveError::Missing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let save: GameSave = bincode::deserialize(&bytes).map_err(CodecError::from)?;
        debug!(
            "Loaded {} objects from {}",
            save.objects.len(),
            self.path.display()
        );
        Ok(save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Direction, Rect};
    use crate::model::{Group, ObjectBody, UserId};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.save", name, ObjectId::generate()))
    }

    fn tank() -> GameObject {
        GameObject {
            id: ObjectId::generate(),
            group: Group::player("c1"),
            location: Rect::new(50, 50, 50, 50),
            direction: Some(Direction::Right),
            health: 70,
            alive: true,
            body: ObjectBody::Tank {
                owner_username: "c1".to_string(),
                owner_user_id: UserId::generate(),
                speed: 5,
            },
        }
    }

    #[test]
    fn test_save_then_load() {
        let store = FileSaveStore::new(temp_path("save-then-load"));
        let tank = tank();
        let mut objects = HashMap::new();
        objects.insert(tank.id.clone(), tank.clone());

        store.save(&tank, &objects).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.tank, tank);
        assert_eq!(loaded.objects, objects);

        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_save_overwrites_previous() {
        let store = FileSaveStore::new(temp_path("save-overwrites"));
        let first = tank();
        let second = tank();

        store.save(&first, &HashMap::new()).unwrap();
        store.save(&second, &HashMap::new()).unwrap();

        assert_eq!(store.load().unwrap().tank, second);
        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let store = FileSaveStore::new(temp_path("missing"));
        assert!(matches!(store.load(), Err(SaveError::Missing(_))));
    }

    #[test]
    fn test_load_corrupt_file() {
        let store = FileSaveStore::new(temp_path("corrupt"));
        fs::write(store.path(), b"not a save").unwrap();

        assert!(matches!(store.load(), Err(SaveError::Codec(_))));
        fs::remove_file(store.path()).unwrap();
    }
}
