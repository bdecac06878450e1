//! TCP connection to the game server

use crate::autopilot::{Autopilot, Command};
use crate::error::ClientError;
use crate::game::ClientGameState;
use log::{debug, info, warn};
use shared::socket::configure_stream;
use shared::{
    write_frame, ClientFire, ClientLogin, ClientMove, CodecError, Direction, FrameReader, Message,
    UserId,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{interval, sleep, MissedTickBehavior};

pub struct Client {
    server_addr: SocketAddr,
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    game_state: ClientGameState,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(server_addr).await?;
        if let Err(e) = configure_stream(&stream) {
            warn!("Failed to set socket options: {}", e);
        }
        let server_addr = stream.peer_addr()?;
        info!("Connected to {}", server_addr);

        let (reader, writer) = stream.into_split();
        Ok(Client {
            server_addr,
            reader: FrameReader::new(reader),
            writer,
            game_state: ClientGameState::new(),
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), ClientError> {
        let frame = message.to_frame()?;
        write_frame(&mut self.writer, &frame).await?;
        Ok(())
    }

    /// Waits for the next message and applies it to the mirror. Frames that
    /// do not decode are skipped.
    pub async fn recv(&mut self) -> Result<Message, ClientError> {
        loop {
            let frame = self
                .reader
                .read_frame()
                .await?
                .ok_or(ClientError::Disconnected)?;

            match Message::from_frame(&frame) {
                Ok(message) => {
                    self.game_state.apply(&message);
                    return Ok(message);
                }
                Err(CodecError::UnknownType(tag)) => {
                    warn!("Ignoring unknown message type {}", tag);
                }
                Err(e) => warn!("Dropping undecodable frame: {}", e),
            }
        }
    }

    /// Logs in and waits for the server's verdict
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<UserId, ClientError> {
        self.send(&Message::ClientLogin(ClientLogin {
            username: username.to_string(),
            password: password.to_string(),
        }))
        .await?;

        loop {
            match self.recv().await? {
                Message::Initialization(init) if init.success => {
                    let user_id = init.user_id.ok_or(ClientError::NotLoggedIn)?;
                    info!(
                        "Logged in as {} ({} objects in the world)",
                        user_id,
                        self.game_state.objects().len()
                    );
                    return Ok(user_id);
                }
                Message::Initialization(init) => {
                    let reason = init.error.unwrap_or_else(|| "no reason given".to_string());
                    return Err(ClientError::LoginRejected(reason));
                }
                other => debug!("Received {:?} before login", other.message_type()),
            }
        }
    }

    fn user_id(&self) -> Result<UserId, ClientError> {
        self.game_state
            .user_id()
            .cloned()
            .ok_or(ClientError::NotLoggedIn)
    }

    pub async fn move_tank(&mut self, direction: Direction) -> Result<(), ClientError> {
        let user_id = self.user_id()?;
        self.send(&Message::ClientMove(ClientMove { user_id, direction }))
            .await
    }

    pub async fn fire(&mut self) -> Result<(), ClientError> {
        let user_id = self.user_id()?;
        self.send(&Message::ClientFire(ClientFire { user_id })).await
    }

    /// Plays with `autopilot` every `cadence` until the tank dies, the server
    /// hangs up or `duration` runs out
    pub async fn run(
        &mut self,
        mut autopilot: Autopilot,
        cadence: Duration,
        duration: Option<Duration>,
    ) -> Result<(), ClientError> {
        let mut commands = interval(cadence);
        commands.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = sleep(duration.unwrap_or(Duration::ZERO));
        tokio::pin!(deadline);

        while !self.game_state.is_game_over() {
            tokio::select! {
                message = self.recv() => {
                    let message = message?;
                    debug!("Received {:?}", message.message_type());
                },

                _ = commands.tick() => {
                    for command in autopilot.next_commands() {
                        match command {
                            Command::Move(direction) => self.move_tank(direction).await?,
                            Command::Fire => self.fire().await?,
                        }
                    }
                },

                _ = &mut deadline, if duration.is_some() => {
                    info!("Run finished after {} autopilot steps", autopilot.steps());
                    return Ok(());
                },
            }
        }

        info!("Game over after {} autopilot steps", autopilot.steps());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Frame, FrameDecoder, GameInitialization, MessageType};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio_test::assert_ok;

    /// Accepts one connection and answers the first frame with `response`
    async fn one_shot_server(response: Message) -> (SocketAddr, tokio::task::JoinHandle<Frame>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut decoder = FrameDecoder::new();
            let request = loop {
                let mut buf = [0u8; 256];
                let n = stream.read(&mut buf).await.unwrap();
                decoder.extend(&buf[..n]);
                if let Some(frame) = decoder.decode().unwrap() {
                    break frame;
                }
            };
            write_frame(&mut stream, &response.to_frame().unwrap())
                .await
                .unwrap();
            request
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (addr, server) =
            one_shot_server(Message::Initialization(GameInitialization::rejected("bad"))).await;

        let mut client = assert_ok!(Client::connect(&addr.to_string()).await);
        let result = client.login("c1", "nope").await;

        assert!(matches!(result, Err(ClientError::LoginRejected(reason)) if reason == "bad"));
        let request = assert_ok!(server.await);
        assert_eq!(request.msg_type(), MessageType::ClientLogin.tag());
    }

    #[tokio::test]
    async fn test_commands_require_login() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = Client::connect(&addr.to_string()).await.unwrap();

        assert!(matches!(client.fire().await, Err(ClientError::NotLoggedIn)));
        assert!(matches!(
            client.move_tank(Direction::Up).await,
            Err(ClientError::NotLoggedIn)
        ));
    }
}
