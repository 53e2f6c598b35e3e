//! Interfaces of the collaborators that sit around the protocol layer.
//!
//! The protocol layer never mutates world state itself. It asks a
//! [`PlayerActions`] implementation to do it and reacts to the outcome, and
//! the roster behind that implementation pushes the consequences back out to
//! every client through [`ClientHandle`].

use crate::error::Result;
use crate::types::{
    BlockId, BlockPos, PlayerIdentity, PlayerSnapshot, Position, Rotation, SpawnPoint,
    WorldBounds,
};
use futures::future::BoxFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

/// Bounds-checked access to the block grid.
pub trait WorldView: Send + Sync {
    fn bounds(&self) -> WorldBounds;

    /// `None` when `pos` lies outside [`WorldView::bounds`].
    fn block_at(&self, pos: BlockPos) -> Option<BlockId>;

    /// Replaces the block at `pos` and returns the previous one.
    fn set_block(&self, pos: BlockPos, block: BlockId) -> Result<BlockId>;

    fn spawn_point(&self) -> SpawnPoint;
}

/// The connection-handler contract: what the roster may ask of any connected
/// client, whatever protocol flavour it speaks.
pub trait ClientHandle: Send + Sync {
    /// Lists `player` in the client's player list.
    fn add_player(&self, player: &PlayerSnapshot) -> Result<()>;
    /// Makes `player`'s entity visible.
    fn spawn_player(&self, player: &PlayerSnapshot) -> Result<()>;
    fn move_player(&self, player: &PlayerSnapshot) -> Result<()>;
    fn remove_player(&self, identity: &PlayerIdentity) -> Result<()>;
    fn block_changed(&self, pos: BlockPos, block: BlockId) -> Result<()>;
    fn message(&self, text: &str) -> Result<()>;
    fn disconnect(&self, reason: &str) -> Result<()>;
}

/// Player-driven mutations. Any of them may answer
/// [`QuarryError::ValidationRejected`](crate::QuarryError::ValidationRejected).
pub trait PlayerActions: Send + Sync {
    /// Everyone currently registered.
    fn online(&self) -> Vec<PlayerSnapshot>;

    /// Registers `player`, replacing an existing entry with the same UUID.
    fn join(&self, player: PlayerSnapshot, client: Arc<dyn ClientHandle>);

    /// Detaches the player; persistence is up to the implementation.
    fn leave(&self, identity: &PlayerIdentity);

    fn move_player(
        &self,
        identity: &PlayerIdentity,
        position: Option<Position>,
        rotation: Option<Rotation>,
    ) -> Result<()>;

    /// Breaks the block at `pos` and returns what was there before.
    fn break_block(&self, identity: &PlayerIdentity, pos: BlockPos) -> Result<BlockId>;

    fn place_block(&self, identity: &PlayerIdentity, pos: BlockPos, block: BlockId)
        -> Result<()>;

    fn chat(&self, identity: &PlayerIdentity, message: &str) -> Result<()>;

    /// `command` comes without its leading slash.
    fn command(&self, identity: &PlayerIdentity, command: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub claimed_uuid: Uuid,
    pub address: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allow { uuid: Uuid, username: String },
    Deny(String),
}

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, request: LoginRequest) -> BoxFuture<'static, AuthDecision>;
}
