//! Server network layer: TCP accept loop, per-connection tasks and the tick task

use crate::client_manager::{Admission, ClientManager, ConnectionId};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::GameState;
use crate::handler::GameService;
use crate::session::SessionDirectory;
use crate::simulation::Simulation;
use bytes::Bytes;
use log::{debug, error, info, warn};
use shared::socket::configure_stream;
use shared::FrameReader;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::Receiver;
use tokio::time::{sleep, timeout};

/// Pause after a failed accept, e.g. when out of file descriptors
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How long a closing connection may take to flush its queued frames
const WRITER_GRACE: Duration = Duration::from_secs(1);

/// Main server coordinating connections and the simulation
pub struct Server {
    config: Arc<ServerConfig>,
    listener: TcpListener,
    service: Arc<GameService>,
}

impl Server {
    /// Binds the listener and builds the world, including the initial walls
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let config = Arc::new(config);
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let game = Arc::new(GameState::new(Arc::clone(&config)));
        game.spawn_default_walls();

        let service = Arc::new(GameService::new(
            Arc::clone(&config),
            game,
            Arc::new(ClientManager::new(config.max_clients)),
            Arc::new(SessionDirectory::new()),
        ));

        Ok(Server {
            config,
            listener,
            service,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn service(&self) -> &Arc<GameService> {
        &self.service
    }

    /// Starts the tick task and accepts connections until the tick task dies
    pub async fn run(self) -> Result<(), ServerError> {
        let simulation = Simulation::new(
            Arc::clone(self.service.game()),
            Arc::clone(self.service.clients()),
        );
        let mut tick_task = tokio::spawn(simulation.run(self.config.tick_duration()));

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.admit(stream, addr),
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        sleep(ACCEPT_BACKOFF).await;
                    }
                },
                result = &mut tick_task => {
                    error!("Simulation task stopped: {:?}", result);
                    return Err(ServerError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "simulation task stopped",
                    )));
                }
            }
        }
    }

    /// Registers an accepted socket and spawns its tasks, or closes it when
    /// the server is full
    fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = configure_stream(&stream) {
            warn!("Failed to set socket options for {}: {}", addr, e);
        }

        let Some(admission) = self.service.clients().add_client(addr) else {
            let refusal = ServerError::ServerFull {
                max: self.service.clients().max_clients(),
            };
            warn!("Refusing {}: {}", addr, refusal);
            return;
        };

        let Admission {
            id: connection,
            outbound,
            deregistered,
        } = admission;

        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            let mut writer_task = tokio::spawn(write_loop(connection, writer, outbound));

            tokio::select! {
                result = read_loop(&service, connection, reader) => match result {
                    Ok(()) => info!("Client {} closed the connection", connection),
                    Err(e) => warn!("Closing client {}: {}", connection, e),
                },
                _ = deregistered => warn!("Client {} was dropped by the server", connection),
            }

            // Dropping the registry entry closes the channel and ends the writer
            service.disconnect(connection);
            match timeout(WRITER_GRACE, &mut writer_task).await {
                Ok(Err(e)) if e.is_panic() => {
                    error!("Writer for client {} panicked: {}", connection, e)
                }
                Ok(_) => {}
                Err(_) => {
                    // Peer is not reading; the writer is stuck in write_all
                    writer_task.abort();
                    debug!("Aborted writer for client {}", connection);
                }
            }
        });
    }
}

async fn read_loop(
    service: &GameService,
    connection: ConnectionId,
    reader: OwnedReadHalf,
) -> Result<(), ServerError> {
    let mut frames = FrameReader::new(reader);
    while let Some(frame) = frames.read_frame().await? {
        service.handle_frame(connection, &frame);
    }
    Ok(())
}

async fn write_loop(
    connection: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outbound: Receiver<Bytes>,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            debug!("Write to client {} failed: {}", connection, e);
            break;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of client {} failed: {}", connection, e);
    }
}
