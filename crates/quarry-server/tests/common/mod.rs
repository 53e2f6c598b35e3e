#![allow(dead_code)]

use bytes::Bytes;
use futures::future::{self, BoxFuture, FutureExt};
use quarry_common::collab::{
    AuthDecision, Authenticator, ClientHandle, LoginRequest, PlayerActions,
};
use quarry_common::config::ServerConfig;
use quarry_common::types::{BlockId, BlockPos, PlayerIdentity, PlayerSnapshot, Position, Rotation};
use quarry_common::{QuarryError, Result};
use quarry_protocol::handshake::{HandshakePacket, NextState};
use quarry_protocol::inventory::{write_slot, ItemStack};
use quarry_protocol::login::LoginStartPacket;
use quarry_protocol::opcodes::{configuration, login, play, PROTOCOL_VERSION};
use quarry_protocol::packet::{encode_packet, MinecraftPacketBuffer};
use quarry_protocol::session::{ServerContext, Session, SessionState};
use quarry_protocol::transport::Transport;
use quarry_server::auth::{offline_uuid, OfflineAuthenticator};
use quarry_world::{FlatWorld, Lobby};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Keeps every payload a session sends, in order.
#[derive(Default)]
pub struct RecordingTransport {
    payloads: Mutex<Vec<Bytes>>,
    compression: Mutex<Option<usize>>,
    closed: AtomicBool,
    /// Closes the transport once this many payloads went out.
    close_after: Option<usize>,
    sent: AtomicUsize,
}

impl RecordingTransport {
    pub fn closing_after(payloads: usize) -> Self {
        Self {
            close_after: Some(payloads),
            ..Self::default()
        }
    }

    pub fn take(&self) -> Vec<Bytes> {
        std::mem::take(&mut *self.payloads.lock().unwrap())
    }

    pub fn take_ids(&self) -> Vec<i32> {
        self.take().iter().map(|payload| packet_id(payload)).collect()
    }

    pub fn compression(&self) -> Option<usize> {
        *self.compression.lock().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, payload: Bytes) -> Result<()> {
        if self.is_closed() {
            return Err(QuarryError::Closed);
        }
        self.payloads.lock().unwrap().push(payload);
        let sent = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        if self.close_after == Some(sent) {
            self.closed.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn enable_compression(&self, threshold: usize) -> Result<()> {
        *self.compression.lock().unwrap() = Some(threshold);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_writable(&self) -> bool {
        !self.is_closed()
    }
}

/// Wraps the lobby and remembers every break and place request.
pub struct RecordingActions {
    pub lobby: Lobby,
    pub breaks: Mutex<Vec<BlockPos>>,
    pub places: Mutex<Vec<(BlockPos, BlockId)>>,
}

impl RecordingActions {
    pub fn breaks(&self) -> Vec<BlockPos> {
        self.breaks.lock().unwrap().clone()
    }

    pub fn places(&self) -> Vec<(BlockPos, BlockId)> {
        self.places.lock().unwrap().clone()
    }
}

impl PlayerActions for RecordingActions {
    fn online(&self) -> Vec<PlayerSnapshot> {
        self.lobby.online()
    }

    fn join(&self, player: PlayerSnapshot, client: Arc<dyn ClientHandle>) {
        self.lobby.join(player, client)
    }

    fn leave(&self, identity: &PlayerIdentity) {
        self.lobby.leave(identity)
    }

    fn move_player(
        &self,
        identity: &PlayerIdentity,
        position: Option<Position>,
        rotation: Option<Rotation>,
    ) -> Result<()> {
        self.lobby.move_player(identity, position, rotation)
    }

    fn break_block(&self, identity: &PlayerIdentity, pos: BlockPos) -> Result<BlockId> {
        self.breaks.lock().unwrap().push(pos);
        self.lobby.break_block(identity, pos)
    }

    fn place_block(&self, identity: &PlayerIdentity, pos: BlockPos, block: BlockId) -> Result<()> {
        self.places.lock().unwrap().push((pos, block));
        self.lobby.place_block(identity, pos, block)
    }

    fn chat(&self, identity: &PlayerIdentity, message: &str) -> Result<()> {
        self.lobby.chat(identity, message)
    }

    fn command(&self, identity: &PlayerIdentity, command: &str) -> Result<()> {
        self.lobby.command(identity, command)
    }
}

pub struct DenyAll(pub &'static str);

impl Authenticator for DenyAll {
    fn authenticate(&self, _request: LoginRequest) -> BoxFuture<'static, AuthDecision> {
        future::ready(AuthDecision::Deny(self.0.to_owned())).boxed()
    }
}

/// A 16x32x16 world (surface at y=16) with millisecond pacing.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.world.width = 16;
    config.world.height = 32;
    config.world.depth = 16;
    config.pacing.handshake_ms = 1;
    config.pacing.stream_ms = 1;
    config.pacing.per_column_ms = 1;
    config.pacing.teleport_ms = 1;
    config
}

pub struct Harness {
    pub context: Arc<ServerContext>,
    pub actions: Arc<RecordingActions>,
    pub world: Arc<FlatWorld>,
}

impl Harness {
    pub fn new(config: ServerConfig) -> Self {
        Self::build(config, None)
    }

    pub fn denying(config: ServerConfig, reason: &'static str) -> Self {
        Self::build(config, Some(Arc::new(DenyAll(reason))))
    }

    fn build(config: ServerConfig, auth: Option<Arc<dyn Authenticator>>) -> Self {
        let world = Arc::new(FlatWorld::generate(config.world.bounds(), config.world.seed));
        let actions = Arc::new(RecordingActions {
            lobby: Lobby::new(world.clone()),
            breaks: Mutex::new(Vec::new()),
            places: Mutex::new(Vec::new()),
        });
        let auth: Arc<dyn Authenticator> = match auth {
            Some(auth) => auth,
            None => Arc::new(OfflineAuthenticator::new(&config, actions.clone())),
        };
        let context = Arc::new(ServerContext::new(config, world.clone(), actions.clone(), auth));
        Self {
            context,
            actions,
            world,
        }
    }

    pub fn session(&self) -> (Session, Arc<RecordingTransport>) {
        self.session_on(Arc::new(RecordingTransport::default()))
    }

    pub fn session_on(&self, transport: Arc<RecordingTransport>) -> (Session, Arc<RecordingTransport>) {
        let session = Session::new(address(), transport.clone(), self.context.clone());
        (session, transport)
    }

    /// Walks a fresh session through login and configuration into the world.
    pub async fn joined(&self, username: &str) -> (Session, Arc<RecordingTransport>) {
        let (mut session, transport) = self.session();
        let now = Instant::now();
        session.handle_frame(&handshake(PROTOCOL_VERSION, NextState::Login), now).await.unwrap();
        session.handle_frame(&login_start(username), now).await.unwrap();
        session.handle_frame(&login_ack(), now).await.unwrap();
        session.handle_frame(&finish_ack(), now).await.unwrap();
        assert_eq!(session.state(), SessionState::InWorld);
        transport.take();
        (session, transport)
    }
}

pub fn address() -> SocketAddr {
    "127.0.0.1:50000".parse().unwrap()
}

pub fn packet_id(payload: &[u8]) -> i32 {
    MinecraftPacketBuffer::from_bytes(payload.to_vec())
        .read_varint()
        .unwrap()
}

/// A reader positioned after the packet id.
pub fn body(payload: &[u8]) -> MinecraftPacketBuffer {
    let mut reader = MinecraftPacketBuffer::from_bytes(payload.to_vec());
    reader.read_varint().unwrap();
    reader
}

pub fn find(payloads: &[Bytes], id: i32) -> Vec<MinecraftPacketBuffer> {
    payloads
        .iter()
        .filter(|payload| packet_id(payload) == id)
        .map(|payload| body(payload))
        .collect()
}

pub fn handshake(protocol_version: i32, next_state: NextState) -> Bytes {
    encode_packet(&HandshakePacket {
        protocol_version,
        server_address: "localhost".to_owned(),
        server_port: 25565,
        next_state,
    })
    .unwrap()
}

pub fn status_request() -> Bytes {
    Bytes::from_static(&[0x00])
}

pub fn ping(payload: i64) -> Bytes {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer.write_varint(0x01).write_i64(payload);
    buffer.into_bytes()
}

pub fn login_start(username: &str) -> Bytes {
    encode_packet(&LoginStartPacket {
        username: username.to_owned(),
        uuid: offline_uuid(username),
    })
    .unwrap()
}

pub fn login_ack() -> Bytes {
    Bytes::from(vec![login::serverbound::LOGIN_ACKNOWLEDGED as u8])
}

pub fn finish_ack() -> Bytes {
    Bytes::from(vec![configuration::serverbound::ACKNOWLEDGE_FINISH as u8])
}

pub fn player_action(status: i32, position: BlockPos, face: u8, sequence: i32) -> Bytes {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer
        .write_varint(play::serverbound::PLAYER_ACTION)
        .write_varint(status)
        .write_position(position)
        .write_u8(face)
        .write_varint(sequence);
    buffer.into_bytes()
}

pub fn use_item_on(position: BlockPos, face: i32, sequence: i32) -> Bytes {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer
        .write_varint(play::serverbound::USE_ITEM_ON)
        .write_varint(0)
        .write_position(position)
        .write_varint(face)
        .write_f32(0.5)
        .write_f32(1.0)
        .write_f32(0.5)
        .write_bool(false)
        .write_varint(sequence);
    buffer.into_bytes()
}

pub fn creative_slot(slot: i16, stack: Option<ItemStack>) -> Bytes {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer
        .write_varint(play::serverbound::SET_CREATIVE_MODE_SLOT)
        .write_i16(slot);
    write_slot(&mut buffer, stack).unwrap();
    buffer.into_bytes()
}

/// A creative-slot packet whose item tree declares a byte array far longer
/// than the bytes that follow it.
pub fn creative_slot_oversized_tree(slot: i16) -> Bytes {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer
        .write_varint(play::serverbound::SET_CREATIVE_MODE_SLOT)
        .write_i16(slot)
        .write_bool(true)
        .write_varint(1)
        .write_i8(1)
        .write_bytes(&[0x07, 0x7F, 0xFF, 0xFF, 0xFF]);
    buffer.into_bytes()
}

pub fn held_item(slot: i16) -> Bytes {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer
        .write_varint(play::serverbound::SET_HELD_ITEM)
        .write_i16(slot);
    buffer.into_bytes()
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
