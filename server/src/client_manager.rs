//! Connection registry and outbound transport for the tank arena server
//!
//! This module tracks every live TCP connection and owns the send primitives
//! used by both connection tasks and the tick task:
//! - Connection admission with a capacity limit
//! - Unicast, broadcast, and broadcast-except-one delivery
//! - Immediate deregistration when a connection closes
//!
//! Each connection has a dedicated writer task draining a bounded channel of
//! encoded frames. Sending never waits on a socket: a connection whose queue
//! is full has stopped reading and is dropped, and a send to a connection
//! that has gone away is logged and discarded without affecting anyone else.

use bytes::Bytes;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use shared::Message;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::sync::oneshot;

/// Server-assigned identifier of one TCP connection
pub type ConnectionId = u32;

/// Frames queued for one connection before it counts as not reading
pub const OUTBOUND_QUEUE: usize = 1024;

/// A connected client and the queue feeding its writer task
#[derive(Debug)]
pub struct Client {
    /// Unique connection identifier assigned by the server
    pub id: ConnectionId,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
    sender: Sender<Bytes>,
    /// Dropped together with the registry entry, which wakes the connection task
    _registered: oneshot::Sender<()>,
}

impl Client {
    /// Queues an encoded frame for this client without waiting
    pub fn send(&self, frame: Bytes) -> Result<(), TrySendError<Bytes>> {
        self.sender.try_send(frame)
    }
}

/// What a connection task receives when its connection is admitted
#[derive(Debug)]
pub struct Admission {
    pub id: ConnectionId,
    /// Encoded frames for the writer task
    pub outbound: Receiver<Bytes>,
    /// Resolves once the connection is no longer registered, whether it
    /// closed or the server dropped it
    pub deregistered: oneshot::Receiver<()>,
}

/// Manages all live connections
///
/// Registration and removal happen concurrently from the accept loop and the
/// connection tasks, while the tick task broadcasts. Sends that race a close
/// may be dropped; a send never reaches a connection removed before it
/// started.
pub struct ClientManager {
    /// Connected clients indexed by their connection ID
    clients: DashMap<ConnectionId, Client>,
    /// Next connection ID to hand out
    next_client_id: AtomicU32,
    /// Maximum number of concurrent connections allowed
    max_clients: usize,
    /// Capacity of each connection's outbound queue
    queue_capacity: usize,
}

impl ClientManager {
    /// Creates an empty registry. Connection IDs start from 1.
    pub fn new(max_clients: usize) -> Self {
        Self::with_queue_capacity(max_clients, OUTBOUND_QUEUE)
    }

    pub fn with_queue_capacity(max_clients: usize, queue_capacity: usize) -> Self {
        Self {
            clients: DashMap::new(),
            next_client_id: AtomicU32::new(1),
            max_clients,
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Registers a new connection
    ///
    /// Returns `None` when the server is at capacity; the caller is expected
    /// to close the socket.
    pub fn add_client(&self, addr: SocketAddr) -> Option<Admission> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (sender, outbound) = mpsc::channel(self.queue_capacity);
        let (registered, deregistered) = oneshot::channel();
        self.clients.insert(
            client_id,
            Client {
                id: client_id,
                addr,
                connected_at: Instant::now(),
                sender,
                _registered: registered,
            },
        );
        info!("Client {} connected from {}", client_id, addr);

        Some(Admission {
            id: client_id,
            outbound,
            deregistered,
        })
    }

    /// Deregisters a connection. Returns true if it was still registered.
    pub fn remove_client(&self, client_id: ConnectionId) -> bool {
        if let Some((_, client)) = self.clients.remove(&client_id) {
            info!(
                "Client {} disconnected after {:.1}s",
                client.id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, client_id: ConnectionId) -> bool {
        self.clients.contains_key(&client_id)
    }

    pub fn client_ids(&self) -> Vec<ConnectionId> {
        self.clients.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Sends an encoded frame to one connection
    pub fn send_to(&self, client_id: ConnectionId, frame: Bytes) -> bool {
        // The map guard must be gone before a lagging client is removed
        let result = match self.clients.get(&client_id) {
            Some(client) => client.send(frame),
            None => {
                debug!("Dropped frame for unknown client {}", client_id);
                return false;
            }
        };

        match result {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.drop_lagging(client_id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Dropped frame for closing client {}", client_id);
                false
            }
        }
    }

    /// Sends an encoded frame to every connection. Returns how many got it.
    pub fn broadcast(&self, frame: Bytes) -> usize {
        self.deliver(frame, None)
    }

    /// Sends an encoded frame to every connection except `excluded`
    pub fn broadcast_except(&self, excluded: ConnectionId, frame: Bytes) -> usize {
        self.deliver(frame, Some(excluded))
    }

    fn deliver(&self, frame: Bytes, excluded: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        let mut lagging = Vec::new();
        for client in self.clients.iter() {
            if Some(client.id) == excluded {
                continue;
            }
            // Bytes clones share the same buffer
            match client.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => lagging.push(client.id),
                Err(TrySendError::Closed(_)) => {
                    warn!("Dropped broadcast for closing client {}", client.id)
                }
            }
        }

        for client_id in lagging {
            self.drop_lagging(client_id);
        }
        delivered
    }

    fn drop_lagging(&self, client_id: ConnectionId) {
        warn!(
            "Client {} stopped reading with {} frames queued, dropping it",
            client_id, self.queue_capacity
        );
        self.remove_client(client_id);
    }

    pub fn send_message(&self, client_id: ConnectionId, message: &Message) -> bool {
        match encode(message) {
            Some(frame) => self.send_to(client_id, frame),
            None => false,
        }
    }

    pub fn broadcast_message(&self, message: &Message) -> usize {
        encode(message).map_or(0, |frame| self.broadcast(frame))
    }

    pub fn broadcast_message_except(&self, excluded: ConnectionId, message: &Message) -> usize {
        encode(message).map_or(0, |frame| self.broadcast_except(excluded, frame))
    }
}

/// Encodes a message once so it can be shared by every recipient
fn encode(message: &Message) -> Option<Bytes> {
    match message.to_frame() {
        Ok(frame) => Some(frame.encode()),
        Err(e) => {
            error!("Failed to encode {:?}: {}", message.message_type(), e);
            None
        }
    }
}
