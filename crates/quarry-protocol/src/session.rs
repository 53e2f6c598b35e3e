//! Per-connection state machine.
//!
//! Lifecycle: `Connected -> Identified -> InWorld -> Closed`, tracked apart
//! from the wire phase (handshaking, status, login, configuration, play).
//! Every mutation of shared state goes through the [`PlayerActions`]
//! collaborator; the session only sends packets and reacts to outcomes.

use crate::block_update::{BlockUpdatePacket, WorldEventPacket};
use crate::blocks::{self, BOUNDARY_STATE};
use crate::configuration::{
    ClientInformationPacket, ConfigDisconnectPacket, ConfigPluginMessagePacket,
    FinishConfigurationPacket, RegistryDataPacket,
};
use crate::handlers;
use crate::handshake::{HandshakePacket, NextState};
use crate::inventory::{Inventory, ItemStack};
use crate::keep_alive::KeepAlivePacket;
use crate::layout::DimensionLayout;
use crate::login::{LoginDisconnectPacket, LoginStartPacket, LoginSuccessPacket, SetCompressionPacket};
use crate::messages::DisconnectPacket;
use crate::opcodes::{self, configuration, login, status, PROTOCOL_VERSION, VERSION_NAME};
use crate::packet::{encode_packet, MinecraftPacketBuffer, Packet};
use crate::player_action::adjacent;
use crate::registry::registry_codec;
use crate::status::{PingPacket, ServerStatus, StatusResponsePacket};
use crate::transport::Transport;
use quarry_common::collab::{AuthDecision, Authenticator, LoginRequest, PlayerActions, WorldView};
use quarry_common::config::ServerConfig;
use quarry_common::types::{BlockPos, PlayerIdentity, PlayerSnapshot, Position, Rotation};
use quarry_common::{QuarryError, Result};
use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::{Debug, Info, Warning};
use quarry_logger::systime;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// How long a started dig may stay pending before the tick completes it.
pub const DIG_TIMEOUT: Duration = Duration::from_millis(200);

/// Server software name sent on the brand channel.
pub const BRAND: &str = "quarry";

static NEXT_ENTITY_ID: AtomicI32 = AtomicI32::new(1);

fn next_entity_id() -> i32 {
    NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed)
}

/// Everything sessions share: configuration and the collaborators.
pub struct ServerContext {
    pub config: ServerConfig,
    pub layout: DimensionLayout,
    pub world: Arc<dyn WorldView>,
    pub players: Arc<dyn PlayerActions>,
    pub auth: Arc<dyn Authenticator>,
}

impl ServerContext {
    pub fn new(
        config: ServerConfig,
        world: Arc<dyn WorldView>,
        players: Arc<dyn PlayerActions>,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        let layout = DimensionLayout::new(world.bounds());
        Self {
            config,
            layout,
            world,
            players,
            auth,
        }
    }

    pub fn view_distance(&self) -> i32 {
        self.config
            .view_distance
            .unwrap_or_else(|| self.layout.view_distance())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Identified,
    InWorld,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Handshaking,
    Status,
    Login,
    Configuration,
    Play,
}

/// A started dig awaiting completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDig {
    pub position: BlockPos,
    pub started: Instant,
}

pub struct Session {
    address: SocketAddr,
    state: SessionState,
    phase: Phase,
    protocol_version: i32,
    pub(crate) player: Option<PlayerIdentity>,
    pub(crate) position: Position,
    pub(crate) rotation: Rotation,
    pending_dig: Option<PendingDig>,
    pub(crate) inventory: Inventory,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) context: Arc<ServerContext>,
    last_keep_alive: Instant,
    outstanding_keep_alive: Option<(i64, Instant)>,
    pub(crate) joins: u32,
    /// Whether the roster currently holds this session's player.
    pub(crate) registered: bool,
    pub(crate) teleport_id: i32,
    compression: Option<usize>,
}

impl Session {
    pub fn new(address: SocketAddr, transport: Arc<dyn Transport>, context: Arc<ServerContext>) -> Self {
        Self {
            address,
            state: SessionState::Connected,
            phase: Phase::Handshaking,
            protocol_version: 0,
            player: None,
            position: Position::default(),
            rotation: Rotation::default(),
            pending_dig: None,
            inventory: Inventory::new(),
            transport,
            context,
            last_keep_alive: Instant::now(),
            outstanding_keep_alive: None,
            joins: 0,
            registered: false,
            teleport_id: 0,
            compression: None,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    pub fn player(&self) -> Option<&PlayerIdentity> {
        self.player.as_ref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn pending_dig(&self) -> Option<PendingDig> {
        self.pending_dig
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Compression threshold in effect for incoming frames, once enabled.
    pub fn compression(&self) -> Option<usize> {
        self.compression
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Associates the authenticated player with this session.
    pub fn set_player(&mut self, identity: PlayerIdentity) {
        self.player = Some(identity);
        if self.state == SessionState::Connected {
            self.state = SessionState::Identified;
        }
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn identity(&self) -> Result<PlayerIdentity> {
        self.player
            .clone()
            .ok_or_else(|| QuarryError::protocol("No player is associated with the session"))
    }

    pub(crate) fn snapshot(&self) -> Result<PlayerSnapshot> {
        Ok(PlayerSnapshot {
            identity: self.identity()?,
            position: self.position,
            rotation: self.rotation,
        })
    }

    /// Queues a packet. Fails with [`QuarryError::Closed`] once the session or transport is gone.
    pub fn send<T: Packet>(&self, packet: &T) -> Result<()> {
        if self.is_closed() {
            return Err(QuarryError::Closed);
        }
        self.transport.send(encode_packet(packet)?)
    }

    /// Handles one unframed payload (`id + body`).
    pub async fn handle_frame(&mut self, frame: &[u8], now: Instant) -> Result<()> {
        if self.is_closed() {
            return Err(QuarryError::Closed);
        }

        let mut reader = MinecraftPacketBuffer::from_bytes(frame.to_vec());
        let packet_id = reader.read_varint()?;

        match self.phase {
            Phase::Handshaking => self.handle_handshake(packet_id, &mut reader),
            Phase::Status => self.handle_status(packet_id, &mut reader),
            Phase::Login => self.handle_login(packet_id, &mut reader).await,
            Phase::Configuration => self.handle_configuration(packet_id, &mut reader).await,
            Phase::Play => handlers::dispatch(self, packet_id, &mut reader, now),
        }
    }

    fn handle_handshake(&mut self, packet_id: i32, reader: &mut MinecraftPacketBuffer) -> Result<()> {
        if packet_id != opcodes::handshake::HANDSHAKE {
            return Err(QuarryError::protocol(format!(
                "Expected a handshake, got packet 0x{:02x}",
                packet_id
            )));
        }
        let handshake = HandshakePacket::read_from_buffer(reader)?;
        log(
            format!(
                "{} handshake: protocol {}, next state {:?}",
                self.address, handshake.protocol_version, handshake.next_state
            ),
            Debug,
        );
        self.protocol_version = handshake.protocol_version;
        self.phase = match handshake.next_state {
            NextState::Status => Phase::Status,
            NextState::Login => Phase::Login,
        };
        Ok(())
    }

    fn handle_status(&mut self, packet_id: i32, reader: &mut MinecraftPacketBuffer) -> Result<()> {
        match packet_id {
            status::serverbound::STATUS_REQUEST => {
                let config = &self.context.config;
                let online = self.context.players.online().len();
                let status = ServerStatus::new(&config.motd, online, config.max_players);
                self.send(&StatusResponsePacket::new(&status)?)
            }
            status::serverbound::PING => {
                let ping = PingPacket::read_from_buffer(reader)?;
                self.send(&ping)?;
                self.shutdown();
                Ok(())
            }
            other => Err(QuarryError::protocol(format!(
                "Unexpected status packet 0x{:02x}",
                other
            ))),
        }
    }

    async fn handle_login(&mut self, packet_id: i32, reader: &mut MinecraftPacketBuffer) -> Result<()> {
        match packet_id {
            login::serverbound::LOGIN_START => {
                let start = LoginStartPacket::read_from_buffer(reader)?;
                self.login(start).await
            }
            login::serverbound::LOGIN_ACKNOWLEDGED => {
                if self.state != SessionState::Identified {
                    return Err(QuarryError::protocol("Login acknowledged before login succeeded"));
                }
                self.phase = Phase::Configuration;
                self.configure()
            }
            other => Err(QuarryError::protocol(format!(
                "Unexpected login packet 0x{:02x}",
                other
            ))),
        }
    }

    async fn login(&mut self, start: LoginStartPacket) -> Result<()> {
        if self.protocol_version != PROTOCOL_VERSION {
            log(
                format!(
                    "{} ({}) tried to log in with protocol {}",
                    start.username, self.address, self.protocol_version
                ),
                Info,
            );
            let reason = if self.protocol_version < PROTOCOL_VERSION {
                format!("Outdated client! Please use {}", VERSION_NAME)
            } else {
                format!("Outdated server! I'm still on {}", VERSION_NAME)
            };
            self.close(&reason);
            return Ok(());
        }

        let request = LoginRequest {
            username: start.username,
            claimed_uuid: start.uuid,
            address: self.address,
        };
        match self.context.auth.authenticate(request).await {
            AuthDecision::Allow { uuid, username } => {
                log(format!("{} ({}) logged in as {}", username, self.address, uuid), Info);
                self.set_player(PlayerIdentity {
                    uuid,
                    username: username.clone(),
                    entity_id: next_entity_id(),
                });

                if let Some(threshold) = self.context.config.compression() {
                    self.send(&SetCompressionPacket {
                        threshold: threshold as i32,
                    })?;
                    self.transport.enable_compression(threshold)?;
                    self.compression = Some(threshold);
                }
                self.send(&LoginSuccessPacket { uuid, username })
            }
            AuthDecision::Deny(reason) => {
                log(format!("Login from {} denied: {}", self.address, reason), Info);
                self.close(&reason);
                Ok(())
            }
        }
    }

    fn configure(&mut self) -> Result<()> {
        self.send(&ConfigPluginMessagePacket::brand(BRAND))?;
        self.send(&RegistryDataPacket {
            codec: registry_codec(&self.context.layout),
        })?;
        self.send(&FinishConfigurationPacket)
    }

    async fn handle_configuration(
        &mut self,
        packet_id: i32,
        reader: &mut MinecraftPacketBuffer,
    ) -> Result<()> {
        match packet_id {
            configuration::serverbound::ACKNOWLEDGE_FINISH => {
                self.phase = Phase::Play;
                self.send_world().await
            }
            configuration::serverbound::CLIENT_INFORMATION => {
                let info = ClientInformationPacket::read_from_buffer(reader)?;
                log(format!("{} client information: {:?}", self.address, info), Debug);
                Ok(())
            }
            configuration::serverbound::PLUGIN_MESSAGE | configuration::serverbound::KEEP_ALIVE => {
                Ok(())
            }
            other => {
                log(
                    format!("Ignoring configuration packet 0x{:02x} from {}", other, self.address),
                    Debug,
                );
                Ok(())
            }
        }
    }

    /// Periodic work: keep-alives and completion of digs the client never finished.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        if let Some(pending) = self.pending_dig {
            if now.saturating_duration_since(pending.started) >= DIG_TIMEOUT {
                self.finish_dig(pending.position)?;
            }
        }

        if self.phase != Phase::Play {
            return Ok(());
        }

        let config = &self.context.config;
        let (interval, timeout) = (config.keep_alive_interval(), config.keep_alive_timeout());
        match self.outstanding_keep_alive {
            Some((_, sent)) => {
                if now.saturating_duration_since(sent) >= timeout {
                    log(format!("{} timed out", self.address), Info);
                    self.close("Timed out");
                }
            }
            None => {
                if now.saturating_duration_since(self.last_keep_alive) >= interval {
                    let id = systime::unix_millis();
                    self.send(&KeepAlivePacket::new(id))?;
                    self.outstanding_keep_alive = Some((id, now));
                    self.last_keep_alive = now;
                }
            }
        }
        Ok(())
    }

    pub fn keep_alive_response(&mut self, id: i64) {
        match self.outstanding_keep_alive {
            Some((expected, _)) if expected == id => self.outstanding_keep_alive = None,
            _ => log(
                format!("{} answered an unknown keep-alive {}", self.address, id),
                Debug,
            ),
        }
    }

    /// Records a dig, replacing any earlier one.
    pub fn start_dig(&mut self, position: BlockPos, now: Instant) {
        self.pending_dig = Some(PendingDig {
            position,
            started: now,
        });
    }

    pub fn cancel_dig(&mut self) {
        self.pending_dig = None;
    }

    pub(crate) fn clear_pending_dig(&mut self) {
        self.pending_dig = None;
    }

    /// Forgets any outstanding keep-alive and starts a fresh interval at `now`.
    /// Replies that queued up unread while the session was busy stay unknown.
    pub(crate) fn restart_keep_alive(&mut self, now: Instant) {
        self.outstanding_keep_alive = None;
        self.last_keep_alive = now;
    }

    /// Breaks the block at `position`, or puts the boundary block back when
    /// the position lies outside the world.
    pub fn finish_dig(&mut self, position: BlockPos) -> Result<()> {
        self.pending_dig = None;
        let identity = self.identity()?;

        if !self.context.world.bounds().contains(position) {
            return self.send(&BlockUpdatePacket {
                position,
                block_state: BOUNDARY_STATE,
            });
        }

        match self.context.players.break_block(&identity, position) {
            Ok(previous) => self.send(&WorldEventPacket::block_break(
                position,
                blocks::state_for(previous),
            )),
            Err(QuarryError::ValidationRejected(reason)) => {
                log(
                    format!("{} may not break {:?}: {}", identity.username, position, reason),
                    Debug,
                );
                self.resend_block(position)
            }
            Err(err) => Err(err),
        }
    }

    /// Places the held block against `face` of `position`. When nothing
    /// placeable is held, or the placement is refused, the authoritative
    /// block is sent back instead.
    pub fn use_item_on(&mut self, position: BlockPos, face: i32) -> Result<()> {
        let target = adjacent(position, face)?;
        let identity = self.identity()?;

        let held_block = self
            .inventory
            .held()
            .and_then(|stack| blocks::block_for_item(stack.item));
        let placed = match held_block {
            Some(block) => match self.context.players.place_block(&identity, target, block) {
                Ok(()) => true,
                Err(QuarryError::ValidationRejected(reason)) => {
                    log(
                        format!("{} may not place at {:?}: {}", identity.username, target, reason),
                        Debug,
                    );
                    false
                }
                Err(err) => return Err(err),
            },
            None => false,
        };

        if !placed {
            self.resend_block(target)?;
        }
        Ok(())
    }

    /// Sends the server's block at `position`, the boundary block outside the world.
    pub fn resend_block(&self, position: BlockPos) -> Result<()> {
        let block_state = self
            .context
            .world
            .block_at(position)
            .map(blocks::state_for)
            .unwrap_or(BOUNDARY_STATE);
        self.send(&BlockUpdatePacket {
            position,
            block_state,
        })
    }

    pub fn move_player(&mut self, position: Option<Position>, rotation: Option<Rotation>) -> Result<()> {
        let identity = self.identity()?;
        if let Some(position) = position {
            self.position = position;
        }
        if let Some(rotation) = rotation {
            self.rotation = rotation;
        }
        match self.context.players.move_player(&identity, position, rotation) {
            Err(QuarryError::ValidationRejected(reason)) => {
                log(format!("{} may not move: {}", identity.username, reason), Debug);
                Ok(())
            }
            other => other,
        }
    }

    pub fn select_hotbar(&mut self, slot: i16) -> Result<()> {
        let slot = usize::try_from(slot)
            .map_err(|_| QuarryError::protocol(format!("Hotbar slot {} out of range", slot)))?;
        self.inventory.select(slot)
    }

    /// Sets an inventory slot from the creative menu; slot -1 drops the stack.
    pub fn set_creative_slot(&mut self, slot: i16, stack: Option<ItemStack>) -> Result<()> {
        if slot == -1 {
            return Ok(());
        }
        let slot = usize::try_from(slot)
            .map_err(|_| QuarryError::protocol(format!("Slot {} out of range", slot)))?;
        self.inventory.set(slot, stack)
    }

    pub fn chat(&self, message: &str) -> Result<()> {
        let identity = self.identity()?;
        self.context.players.chat(&identity, message)
    }

    pub fn command(&self, command: &str) -> Result<()> {
        let identity = self.identity()?;
        self.context.players.command(&identity, command)
    }

    /// Ends the session: detaches the player, sends a best-effort
    /// disconnect if the transport can still take it, and closes the transport.
    pub fn close(&mut self, reason: &str) {
        if self.is_closed() {
            return;
        }
        if self.transport.is_writable() {
            let sent = match self.phase {
                Phase::Login => self.send(&LoginDisconnectPacket::new(reason)),
                Phase::Configuration => self.send(&ConfigDisconnectPacket {
                    reason: reason.to_owned(),
                }),
                Phase::Play => self.send(&DisconnectPacket {
                    reason: reason.to_owned(),
                }),
                Phase::Handshaking | Phase::Status => Ok(()),
            };
            if let Err(err) = sent {
                log(format!("Failed to disconnect {}: {}", self.address, err), Warning);
            }
        }
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.registered {
            if let Some(identity) = &self.player {
                self.context.players.leave(identity);
                log(format!("{} left the game", identity.username), Info);
            }
            self.registered = false;
        }
        self.pending_dig = None;
        self.state = SessionState::Closed;
        self.transport.close();
    }
}
