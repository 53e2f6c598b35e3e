//! The protocol-765 side of the connection-handler contract: roster events
//! turned into play packets on a client's transport.

use crate::block_update::BlockUpdatePacket;
use crate::blocks;
use crate::entity::{
    RemoveEntitiesPacket, SetHeadRotationPacket, SpawnEntityPacket, TeleportEntityPacket,
};
use crate::messages::{DisconnectPacket, SystemChatPacket};
use crate::packet::{encode_packet, Packet};
use crate::player_info::{PlayerInfoEntry, PlayerInfoRemovePacket, PlayerInfoUpdatePacket};
use crate::transport::Transport;
use quarry_common::collab::ClientHandle;
use quarry_common::types::{BlockId, BlockPos, GameMode, PlayerIdentity, PlayerSnapshot};
use quarry_common::Result;
use std::sync::Arc;

pub struct ModernClient {
    transport: Arc<dyn Transport>,
    game_mode: GameMode,
}

impl ModernClient {
    /// `game_mode` is what other players are listed with on this client.
    pub fn new(transport: Arc<dyn Transport>, game_mode: GameMode) -> Self {
        Self {
            transport,
            game_mode,
        }
    }

    fn send<T: Packet>(&self, packet: &T) -> Result<()> {
        self.transport.send(encode_packet(packet)?)
    }
}

impl ClientHandle for ModernClient {
    fn add_player(&self, player: &PlayerSnapshot) -> Result<()> {
        self.send(&PlayerInfoUpdatePacket::add(vec![PlayerInfoEntry::new(
            &player.identity,
            self.game_mode,
        )]))
    }

    fn spawn_player(&self, player: &PlayerSnapshot) -> Result<()> {
        self.send(&SpawnEntityPacket::player(player))?;
        self.send(&SetHeadRotationPacket::player(player))
    }

    fn move_player(&self, player: &PlayerSnapshot) -> Result<()> {
        self.send(&TeleportEntityPacket::player(player))?;
        self.send(&SetHeadRotationPacket::player(player))
    }

    fn remove_player(&self, identity: &PlayerIdentity) -> Result<()> {
        self.send(&RemoveEntitiesPacket {
            entity_ids: vec![identity.entity_id],
        })?;
        self.send(&PlayerInfoRemovePacket {
            uuids: vec![identity.uuid],
        })
    }

    fn block_changed(&self, pos: BlockPos, block: BlockId) -> Result<()> {
        self.send(&BlockUpdatePacket {
            position: pos,
            block_state: blocks::state_for(block),
        })
    }

    fn message(&self, text: &str) -> Result<()> {
        self.send(&SystemChatPacket::chat(text))
    }

    fn disconnect(&self, reason: &str) -> Result<()> {
        let result = self.send(&DisconnectPacket {
            reason: reason.to_owned(),
        });
        self.transport.close();
        result
    }
}
