//! Message catalog: typed payloads and their stable wire tags
//!
//! The tag table below is part of the wire contract. Tags are assigned
//! explicitly and must never be renumbered; new kinds get new tags.

use crate::error::CodecError;
use crate::frame::Frame;
use crate::geometry::Direction;
use crate::model::{GameObject, ObjectId, ObjectStatus, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Stable message type tags carried in the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    ClientLogin,
    Initialization,
    NewObject,
    ObjectDie,
    ClientMove,
    ClientFire,
    StatusUpdate,
}

impl MessageType {
    pub const ALL: [MessageType; 7] = [
        MessageType::ClientLogin,
        MessageType::Initialization,
        MessageType::NewObject,
        MessageType::ObjectDie,
        MessageType::ClientMove,
        MessageType::ClientFire,
        MessageType::StatusUpdate,
    ];

    pub fn tag(self) -> u16 {
        match self {
            MessageType::ClientLogin => 0,
            MessageType::Initialization => 1,
            MessageType::NewObject => 2,
            MessageType::ObjectDie => 3,
            MessageType::ClientMove => 4,
            MessageType::ClientFire => 5,
            MessageType::StatusUpdate => 6,
        }
    }

    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(MessageType::ClientLogin),
            1 => Some(MessageType::Initialization),
            2 => Some(MessageType::NewObject),
            3 => Some(MessageType::ObjectDie),
            4 => Some(MessageType::ClientMove),
            5 => Some(MessageType::ClientFire),
            6 => Some(MessageType::StatusUpdate),
            _ => None,
        }
    }
}

/// Client → server: request to join with credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLogin {
    pub username: String,
    pub password: String,
}

/// Server → client: login outcome plus the full world on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInitialization {
    pub success: bool,
    pub error: Option<String>,
    pub user_id: Option<UserId>,
    pub tank: Option<GameObject>,
    pub objects: Vec<GameObject>,
}

impl GameInitialization {
    pub fn accepted(user_id: UserId, tank: GameObject, objects: Vec<GameObject>) -> Self {
        Self {
            success: true,
            error: None,
            user_id: Some(user_id),
            tank: Some(tank),
            objects,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            user_id: None,
            tank: None,
            objects: Vec::new(),
        }
    }
}

/// Server → clients: a freshly created object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewObject {
    pub owner_user_id: Option<UserId>,
    pub object: GameObject,
}

/// Server → clients: an object was removed from the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDie {
    pub id: ObjectId,
    pub type_name: String,
}

/// Client → server: turn and advance the player's tank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMove {
    pub user_id: UserId,
    pub direction: Direction,
}

/// Client → server: fire from the player's tank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFire {
    pub user_id: UserId,
}

/// Server → clients: statuses that changed since the last broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub list: Vec<ObjectStatus>,
}

/// Any message of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ClientLogin(ClientLogin),
    Initialization(GameInitialization),
    NewObject(NewObject),
    ObjectDie(ObjectDie),
    ClientMove(ClientMove),
    ClientFire(ClientFire),
    StatusUpdate(StatusUpdate),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::ClientLogin(_) => MessageType::ClientLogin,
            Message::Initialization(_) => MessageType::Initialization,
            Message::NewObject(_) => MessageType::NewObject,
            Message::ObjectDie(_) => MessageType::ObjectDie,
            Message::ClientMove(_) => MessageType::ClientMove,
            Message::ClientFire(_) => MessageType::ClientFire,
            Message::StatusUpdate(_) => MessageType::StatusUpdate,
        }
    }

    /// Serializes the payload with `codec` and wraps it in a frame
    pub fn to_frame_with<C: BodyCodec>(&self, codec: &C) -> Result<Frame, CodecError> {
        let body = match self {
            Message::ClientLogin(m) => codec.encode(m)?,
            Message::Initialization(m) => codec.encode(m)?,
            Message::NewObject(m) => codec.encode(m)?,
            Message::ObjectDie(m) => codec.encode(m)?,
            Message::ClientMove(m) => codec.encode(m)?,
            Message::ClientFire(m) => codec.encode(m)?,
            Message::StatusUpdate(m) => codec.encode(m)?,
        };
        Ok(Frame::new(self.message_type().tag(), body)?)
    }

    /// Resolves the frame's tag and deserializes its body with `codec`
    pub fn from_frame_with<C: BodyCodec>(frame: &Frame, codec: &C) -> Result<Self, CodecError> {
        let msg_type = MessageType::from_tag(frame.msg_type())
            .ok_or(CodecError::UnknownType(frame.msg_type()))?;
        let body = frame.body();

        Ok(match msg_type {
            MessageType::ClientLogin => Message::ClientLogin(codec.decode(body)?),
            MessageType::Initialization => Message::Initialization(codec.decode(body)?),
            MessageType::NewObject => Message::NewObject(codec.decode(body)?),
            MessageType::ObjectDie => Message::ObjectDie(codec.decode(body)?),
            MessageType::ClientMove => Message::ClientMove(codec.decode(body)?),
            MessageType::ClientFire => Message::ClientFire(codec.decode(body)?),
            MessageType::StatusUpdate => Message::StatusUpdate(codec.decode(body)?),
        })
    }

    pub fn to_frame(&self) -> Result<Frame, CodecError> {
        self.to_frame_with(&BincodeCodec)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, CodecError> {
        Self::from_frame_with(frame, &BincodeCodec)
    }
}

/// Pluggable body serializer. Must round-trip deterministically.
pub trait BodyCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Default body serializer backed by bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl BodyCodec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameDecoder;
    use crate::geometry::Rect;
    use crate::model::{Group, ObjectBody};

    fn sample_tank() -> GameObject {
        GameObject {
            id: ObjectId::from("tank-1"),
            group: Group::player("c1"),
            location: Rect::new(50, 50, 50, 50),
            direction: Some(Direction::Right),
            health: 100,
            alive: true,
            body: ObjectBody::Tank {
                owner_username: "c1".to_string(),
                owner_user_id: UserId::from("user-1"),
                speed: 5,
            },
        }
    }

    fn sample_wall() -> GameObject {
        GameObject {
            id: ObjectId::from("wall-1"),
            group: Group::system(),
            location: Rect::new(150, 150, 200, 50),
            direction: None,
            health: crate::model::INDESTRUCTIBLE_HEALTH,
            alive: true,
            body: ObjectBody::Wall,
        }
    }

    fn catalog() -> Vec<Message> {
        vec![
            Message::ClientLogin(ClientLogin {
                username: "c1".to_string(),
                password: "123456".to_string(),
            }),
            Message::Initialization(GameInitialization::accepted(
                UserId::from("user-1"),
                sample_tank(),
                vec![sample_tank(), sample_wall()],
            )),
            Message::NewObject(NewObject {
                owner_user_id: None,
                object: sample_wall(),
            }),
            Message::ObjectDie(ObjectDie {
                id: ObjectId::from("tank-1"),
                type_name: "Tank".to_string(),
            }),
            Message::ClientMove(ClientMove {
                user_id: UserId::from("user-1"),
                direction: Direction::Up,
            }),
            Message::ClientFire(ClientFire {
                user_id: UserId::from("user-1"),
            }),
            Message::StatusUpdate(StatusUpdate {
                list: vec![sample_tank().status(), sample_wall().status()],
            }),
        ]
    }

    #[test]
    fn test_tag_table_is_stable() {
        assert_eq!(MessageType::ClientLogin.tag(), 0);
        assert_eq!(MessageType::Initialization.tag(), 1);
        assert_eq!(MessageType::NewObject.tag(), 2);
        assert_eq!(MessageType::ObjectDie.tag(), 3);
        assert_eq!(MessageType::ClientMove.tag(), 4);
        assert_eq!(MessageType::ClientFire.tag(), 5);
        assert_eq!(MessageType::StatusUpdate.tag(), 6);
    }

    #[test]
    fn test_from_tag_inverts_tag() {
        for msg_type in MessageType::ALL {
            assert_eq!(MessageType::from_tag(msg_type.tag()), Some(msg_type));
        }
        assert_eq!(MessageType::from_tag(7), None);
        assert_eq!(MessageType::from_tag(u16::MAX), None);
    }

    #[test]
    fn test_every_kind_survives_the_wire() {
        for message in catalog() {
            let frame = message.to_frame().unwrap();
            assert_eq!(frame.msg_type(), message.message_type().tag());

            let mut decoder = FrameDecoder::new();
            decoder.extend(&frame.encode());
            let received = decoder.decode().unwrap().unwrap();

            assert_eq!(received, frame);
            assert_eq!(Message::from_frame(&received).unwrap(), message);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for message in catalog() {
            let a = message.to_frame().unwrap().encode();
            let b = message.to_frame().unwrap().encode();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let frame = Frame::new(42, &b"whatever"[..]).unwrap();
        assert!(matches!(
            Message::from_frame(&frame),
            Err(CodecError::UnknownType(42))
        ));
    }

    #[test]
    fn test_mismatched_body_is_codec_error() {
        let frame = Frame::new(MessageType::ClientMove.tag(), &b"\x01"[..]).unwrap();
        assert!(matches!(
            Message::from_frame(&frame),
            Err(CodecError::Body(_))
        ));
    }

    #[test]
    fn test_rejected_initialization() {
        let response = GameInitialization::rejected("invalid credentials");
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("invalid credentials"));
        assert!(response.user_id.is_none());
        assert!(response.tank.is_none());
        assert!(response.objects.is_empty());
    }
}
