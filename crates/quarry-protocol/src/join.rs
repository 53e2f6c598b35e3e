//! The world join sequence: metadata, paced chunk stream, other players,
//! roster registration, teleport to spawn.

use crate::chunk_data::{ChunkBatchFinishedPacket, ChunkBatchStartPacket, ChunkDataPacket};
use crate::entity::{SetHeadRotationPacket, SpawnEntityPacket};
use crate::inventory::{SetContainerSlotPacket, SetHeldItemPacket, PLAYER_WINDOW};
use crate::join_game::{JoinGamePacket, RespawnPacket};
use crate::opcodes::VERSION_NAME;
use crate::peer::ModernClient;
use crate::player_info::{PlayerInfoEntry, PlayerInfoUpdatePacket, TabListPacket};
use crate::player_position_and_look::PlayerPositionAndLook;
use crate::session::{Session, SessionState};
use crate::view::{
    GameEventPacket, PlayerAbilitiesPacket, SetCenterChunkPacket, SetDefaultSpawnPositionPacket,
    SetRenderDistancePacket, SetSimulationDistancePacket, START_WAITING_FOR_CHUNKS,
};
use quarry_common::types::{BlockPos, Position};
use quarry_common::{QuarryError, Result};
use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::Info;
use std::sync::Arc;
use tokio::time::{sleep, Instant};

fn block_of(position: Position) -> BlockPos {
    BlockPos::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

impl Session {
    /// Runs the join sequence, or the respawn sequence on every later call.
    ///
    /// Each pacing delay is a suspension point. A transport that closes
    /// while the sequence is suspended makes the next send fail with
    /// [`QuarryError::Closed`], which ends the sequence.
    pub async fn send_world(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(QuarryError::Closed);
        }
        let identity = self.identity()?;
        let context = self.context.clone();
        let config = &context.config;
        let layout = &context.layout;
        let pacing = config.pacing;
        let spawn = context.world.spawn_point();

        log(format!("Sending world to {}", identity.username), Info);
        self.clear_pending_dig();
        self.position = spawn.position;
        self.rotation = spawn.rotation;
        self.set_state(SessionState::Identified);

        if self.joins == 0 {
            self.send(&JoinGamePacket::new(
                identity.entity_id,
                config.game_mode,
                context.view_distance(),
                config.simulation_distance,
            ))?;
        } else {
            self.send(&RespawnPacket::new(config.game_mode))?;
        }
        self.joins += 1;

        self.send(&SetHeldItemPacket {
            slot: self.inventory.selected() as i8,
        })?;
        let slots: Vec<_> = self.inventory.occupied().collect();
        for (slot, stack) in slots {
            self.send(&SetContainerSlotPacket {
                window_id: PLAYER_WINDOW,
                state_id: 0,
                slot: slot as i16,
                stack: Some(stack),
            })?;
        }
        sleep(pacing.handshake()).await;

        let center = block_of(spawn.position);
        self.send(&SetRenderDistancePacket {
            view_distance: context.view_distance(),
        })?;
        self.send(&SetSimulationDistancePacket {
            simulation_distance: config.simulation_distance,
        })?;
        self.send(&SetCenterChunkPacket {
            chunk_x: center.x.div_euclid(16),
            chunk_z: center.z.div_euclid(16),
        })?;
        self.send(&GameEventPacket {
            event: START_WAITING_FOR_CHUNKS,
            value: 0.0,
        })?;
        sleep(pacing.stream()).await;

        self.send(&ChunkBatchStartPacket)?;
        let mut columns = 0;
        for chunk_x in layout.columns_x() {
            for chunk_z in layout.columns_z() {
                let chunk = ChunkDataPacket::build(
                    context.world.as_ref(),
                    layout,
                    chunk_x,
                    chunk_z,
                    config.full_bright,
                )?;
                self.send(&chunk)?;
                columns += 1;
                sleep(pacing.per_column()).await;
            }
        }
        self.send(&ChunkBatchFinishedPacket {
            batch_size: columns,
        })?;
        sleep(pacing.stream()).await;

        for other in context.players.online() {
            if other.identity.uuid == identity.uuid {
                continue;
            }
            self.send(&PlayerInfoUpdatePacket::add(vec![PlayerInfoEntry::new(
                &other.identity,
                config.game_mode,
            )]))?;
            self.send(&SpawnEntityPacket::player(&other))?;
            self.send(&SetHeadRotationPacket::player(&other))?;
        }

        let client = ModernClient::new(self.transport.clone(), config.game_mode);
        context.players.join(self.snapshot()?, Arc::new(client));
        self.registered = true;

        self.send(&SetDefaultSpawnPositionPacket {
            position: center,
            angle: 0.0,
        })?;
        self.send(&TabListPacket {
            header: config.motd.clone(),
            footer: format!("Quarry {}", VERSION_NAME),
        })?;
        sleep(pacing.teleport()).await;

        self.teleport_id += 1;
        self.send(&PlayerPositionAndLook::new(
            spawn.position,
            spawn.rotation,
            self.teleport_id,
        ))?;
        self.send(&PlayerAbilitiesPacket::for_game_mode(config.game_mode))?;

        // No frames were read during the stream, so a pending reply cannot have been seen
        self.restart_keep_alive(Instant::now());
        self.set_state(SessionState::InWorld);
        log(
            format!("{} joined with {} columns", identity.username, columns),
            Info,
        );
        Ok(())
    }
}
