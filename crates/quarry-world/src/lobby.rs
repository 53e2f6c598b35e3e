//! The roster: every joined player, the client each one is reachable
//! through, and validation of player-driven world changes.

use quarry_common::collab::{ClientHandle, PlayerActions, WorldView};
use quarry_common::types::{
    block, BlockId, BlockPos, PlayerIdentity, PlayerSnapshot, Position, Rotation,
};
use quarry_common::{QuarryError, Result};
use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::{Debug, Info};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

struct Member {
    snapshot: PlayerSnapshot,
    client: Arc<dyn ClientHandle>,
}

pub struct Lobby {
    world: Arc<dyn WorldView>,
    members: RwLock<HashMap<Uuid, Member>>,
}

fn rejected(reason: impl Into<String>) -> QuarryError {
    QuarryError::ValidationRejected(reason.into())
}

/// A client that fails to take an event is left to its own session's
/// teardown; the rest of the roster still gets it.
fn deliver(username: &str, result: Result<()>) {
    if let Err(err) = result {
        log(format!("Could not notify {}: {}", username, err), Debug);
    }
}

impl Lobby {
    pub fn new(world: Arc<dyn WorldView>) -> Self {
        Self {
            world,
            members: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.members.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(uuid)
    }

    /// Sends `text` to every member.
    pub fn broadcast(&self, text: &str) {
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        for member in members.values() {
            deliver(&member.snapshot.identity.username, member.client.message(text));
        }
    }

    fn broadcast_block(&self, pos: BlockPos, block: BlockId) {
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        for member in members.values() {
            deliver(
                &member.snapshot.identity.username,
                member.client.block_changed(pos, block),
            );
        }
    }

    /// The member's entry must belong to the same entity; a replaced session
    /// keeps its identity but no longer speaks for the player.
    fn ensure_member(&self, identity: &PlayerIdentity) -> Result<()> {
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        match members.get(&identity.uuid) {
            Some(member) if member.snapshot.identity.entity_id == identity.entity_id => Ok(()),
            _ => Err(rejected(format!("{} is not in the lobby", identity.username))),
        }
    }
}

impl PlayerActions for Lobby {
    fn online(&self) -> Vec<PlayerSnapshot> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|member| member.snapshot.clone())
            .collect()
    }

    fn join(&self, player: PlayerSnapshot, client: Arc<dyn ClientHandle>) {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        let uuid = player.identity.uuid;

        if let Some(previous) = members.remove(&uuid) {
            if previous.snapshot.identity.entity_id != player.identity.entity_id {
                deliver(
                    &previous.snapshot.identity.username,
                    previous.client.disconnect("You logged in from another location"),
                );
            }
            for member in members.values() {
                deliver(
                    &member.snapshot.identity.username,
                    member.client.remove_player(&previous.snapshot.identity),
                );
            }
        }

        for member in members.values() {
            let username = &member.snapshot.identity.username;
            deliver(username, member.client.add_player(&player));
            deliver(username, member.client.spawn_player(&player));
            deliver(
                username,
                member
                    .client
                    .message(&format!("&e{} joined the game", player.identity.username)),
            );
        }
        deliver(&player.identity.username, client.add_player(&player));

        log(
            format!(
                "{} joined the lobby ({} online)",
                player.identity.username,
                members.len() + 1
            ),
            Info,
        );
        members.insert(uuid, Member {
            snapshot: player,
            client,
        });
    }

    fn leave(&self, identity: &PlayerIdentity) {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        match members.get(&identity.uuid) {
            Some(member) if member.snapshot.identity.entity_id == identity.entity_id => {}
            _ => return,
        }
        members.remove(&identity.uuid);

        for member in members.values() {
            let username = &member.snapshot.identity.username;
            deliver(username, member.client.remove_player(identity));
            deliver(
                username,
                member
                    .client
                    .message(&format!("&e{} left the game", identity.username)),
            );
        }
        log(
            format!("{} left the lobby ({} online)", identity.username, members.len()),
            Info,
        );
    }

    fn move_player(
        &self,
        identity: &PlayerIdentity,
        position: Option<Position>,
        rotation: Option<Rotation>,
    ) -> Result<()> {
        if let Some(position) = position {
            if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
                return Err(rejected("position is not finite"));
            }
        }

        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = match members.get_mut(&identity.uuid) {
            Some(member) if member.snapshot.identity.entity_id == identity.entity_id => {
                if let Some(position) = position {
                    member.snapshot.position = position;
                }
                if let Some(rotation) = rotation {
                    member.snapshot.rotation = rotation;
                }
                member.snapshot.clone()
            }
            _ => return Err(rejected(format!("{} is not in the lobby", identity.username))),
        };

        for (uuid, member) in members.iter() {
            if *uuid != identity.uuid {
                deliver(
                    &member.snapshot.identity.username,
                    member.client.move_player(&snapshot),
                );
            }
        }
        Ok(())
    }

    fn break_block(&self, identity: &PlayerIdentity, pos: BlockPos) -> Result<BlockId> {
        self.ensure_member(identity)?;
        let previous = self
            .world
            .block_at(pos)
            .ok_or_else(|| rejected(format!("{:?} is outside the world", pos)))?;
        match previous {
            block::BEDROCK => return Err(rejected("bedrock is unbreakable")),
            block::AIR => return Err(rejected("there is nothing to break")),
            _ => {}
        }

        let previous = self.world.set_block(pos, block::AIR)?;
        self.broadcast_block(pos, block::AIR);
        Ok(previous)
    }

    fn place_block(&self, identity: &PlayerIdentity, pos: BlockPos, block: BlockId) -> Result<()> {
        self.ensure_member(identity)?;
        if block == block::AIR || block > block::MAX {
            return Err(rejected(format!("block {} cannot be placed", block)));
        }
        let current = self
            .world
            .block_at(pos)
            .ok_or_else(|| rejected(format!("{:?} is outside the world", pos)))?;
        if current != block::AIR {
            return Err(rejected(format!("{:?} is occupied", pos)));
        }

        self.world.set_block(pos, block)?;
        self.broadcast_block(pos, block);
        Ok(())
    }

    fn chat(&self, identity: &PlayerIdentity, message: &str) -> Result<()> {
        self.ensure_member(identity)?;
        log(format!("<{}> {}", identity.username, message), Info);
        self.broadcast(&format!("<{}> {}", identity.username, message));
        Ok(())
    }

    fn command(&self, identity: &PlayerIdentity, command: &str) -> Result<()> {
        self.ensure_member(identity)?;
        log(format!("{} issued /{}", identity.username, command), Info);
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(member) = members.get(&identity.uuid) {
            deliver(&identity.username, member.client.message("&cUnknown command"));
        }
        Ok(())
    }
}
