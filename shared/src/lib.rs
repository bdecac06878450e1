//! # Shared Library
//!
//! Types and protocol code used by both the tank arena server and its clients.
//!
//! ## Modules
//!
//! - [`geometry`] - Integer rectangles and movement directions
//! - [`model`] - Object identifiers, groups and wire snapshots of game objects
//! - [`frame`] - Length-prefixed framing over a byte stream
//! - [`message`] - The message catalog with its stable type tags
//! - [`save`] - Save/load of a player's world view
//! - [`socket`] - TCP options for game connections
//! - [`error`] - Error types of the layers above
//!
//! ## Wire Format
//!
//! Every message travels as one frame: a big-endian `u16` type tag, a
//! big-endian `u32` body length, then the body. Bodies are bincode by default
//! and can be swapped through [`message::BodyCodec`].

pub mod error;
pub mod frame;
pub mod geometry;
pub mod message;
pub mod model;
pub mod save;
pub mod socket;

pub use error::{CodecError, ProtocolError, SaveError};
pub use frame::{write_frame, Frame, FrameDecoder, FrameReader, MAX_FRAME_BODY};
pub use geometry::{Direction, Rect};
pub use message::{
    BincodeCodec, BodyCodec, ClientFire, ClientLogin, ClientMove, GameInitialization, Message,
    MessageType, NewObject, ObjectDie, StatusUpdate,
};
pub use model::{GameObject, Group, ObjectBody, ObjectId, ObjectKind, ObjectStatus, UserId};
pub use save::{FileSaveStore, GameSave, SaveStore};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PASSWORD: &str = "123456";
pub const WORLD_WIDTH: i32 = 800;
pub const WORLD_HEIGHT: i32 = 600;

/// Playable area for a window of the given size, leaving room for the frame
/// border and the title bar
pub fn world_bounds(width: i32, height: i32) -> Rect {
    Rect::new(2, 25, width - 4, height - 29)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_world_bounds() {
        let bounds = world_bounds(WORLD_WIDTH, WORLD_HEIGHT);
        assert_eq!(bounds, Rect::new(2, 25, 796, 571));
        assert_eq!(bounds.right(), 798);
        assert_eq!(bounds.bottom(), 596);
    }
}
