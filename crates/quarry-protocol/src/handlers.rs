//! Serverbound play-phase handlers, keyed by opcode.

use crate::block_update::AcknowledgeBlockChangePacket;
use crate::configuration::ClientInformationPacket;
use crate::inventory::{CreativeSlotPacket, HeldItemChangePacket};
use crate::keep_alive::KeepAliveResponsePacket;
use crate::messages::{ChatCommandPacket, ChatMessagePacket};
use crate::opcodes::play::serverbound;
use crate::packet::{MinecraftPacketBuffer, Packet};
use crate::player_action::{DigStatus, PlayerActionPacket, UseItemOnPacket};
use crate::player_position_and_look::{
    rotation_from_degrees, ConfirmTeleportPacket, PlayerPositionAndRotationPacket,
    PlayerPositionPacket, PlayerRotationPacket,
};
use crate::session::Session;
use once_cell::sync::Lazy;
use quarry_common::Result;
use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::Debug;
use std::collections::BTreeMap;
use tokio::time::Instant;

pub type Handler = fn(&mut Session, &mut MinecraftPacketBuffer, Instant) -> Result<()>;

/// Every serverbound play opcode the server understands, with a name for diagnostics.
pub static PLAY_HANDLERS: Lazy<BTreeMap<i32, (&'static str, Handler)>> = Lazy::new(|| {
    let mut handlers: BTreeMap<i32, (&'static str, Handler)> = BTreeMap::new();
    handlers.insert(serverbound::CONFIRM_TELEPORTATION, ("confirm teleportation", confirm_teleport));
    handlers.insert(serverbound::CHAT_COMMAND, ("chat command", chat_command));
    handlers.insert(serverbound::CHAT_MESSAGE, ("chat message", chat_message));
    handlers.insert(serverbound::CHUNK_BATCH_RECEIVED, ("chunk batch received", chunk_batch_received));
    handlers.insert(serverbound::CLIENT_INFORMATION, ("client information", client_information));
    handlers.insert(serverbound::INTERACT, ("interact", ignore));
    handlers.insert(serverbound::KEEP_ALIVE, ("keep alive", keep_alive));
    handlers.insert(serverbound::SET_PLAYER_POSITION, ("set player position", set_position));
    handlers.insert(
        serverbound::SET_PLAYER_POSITION_AND_ROTATION,
        ("set player position and rotation", set_position_and_rotation),
    );
    handlers.insert(serverbound::SET_PLAYER_ROTATION, ("set player rotation", set_rotation));
    handlers.insert(serverbound::PLAYER_ACTION, ("player action", player_action));
    handlers.insert(serverbound::SET_HELD_ITEM, ("set held item", set_held_item));
    handlers.insert(serverbound::SET_CREATIVE_MODE_SLOT, ("set creative mode slot", set_creative_slot));
    handlers.insert(serverbound::USE_ITEM_ON, ("use item on", use_item_on));
    handlers
});

/// Runs the handler for `packet_id`. Opcodes without one are ignored.
pub fn dispatch(
    session: &mut Session,
    packet_id: i32,
    reader: &mut MinecraftPacketBuffer,
    now: Instant,
) -> Result<()> {
    match PLAY_HANDLERS.get(&packet_id) {
        Some((_, handler)) => handler(session, reader, now),
        None => {
            log(
                format!("Ignoring unknown play packet 0x{:02x} from {}", packet_id, session.address()),
                Debug,
            );
            Ok(())
        }
    }
}

fn ignore(_session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    reader.read_remaining();
    Ok(())
}

fn confirm_teleport(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = ConfirmTeleportPacket::read_from_buffer(reader)?;
    log(
        format!("{} confirmed teleport {}", session.address(), packet.teleport_id),
        Debug,
    );
    Ok(())
}

fn chat_command(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = ChatCommandPacket::read_from_buffer(reader)?;
    session.command(&packet.command)
}

fn chat_message(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = ChatMessagePacket::read_from_buffer(reader)?;
    session.chat(&packet.message)
}

fn chunk_batch_received(_session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    // Desired chunks per tick; the stream is paced by configuration instead
    reader.read_f32()?;
    Ok(())
}

fn client_information(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = ClientInformationPacket::read_from_buffer(reader)?;
    log(format!("{} client information: {:?}", session.address(), packet), Debug);
    Ok(())
}

fn keep_alive(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = KeepAliveResponsePacket::read_from_buffer(reader)?;
    session.keep_alive_response(packet.keep_alive_id);
    Ok(())
}

fn set_position(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = PlayerPositionPacket::read_from_buffer(reader)?;
    session.move_player(Some(packet.position), None)
}

fn set_position_and_rotation(
    session: &mut Session,
    reader: &mut MinecraftPacketBuffer,
    _now: Instant,
) -> Result<()> {
    let packet = PlayerPositionAndRotationPacket::read_from_buffer(reader)?;
    session.move_player(
        Some(packet.position),
        Some(rotation_from_degrees(packet.yaw, packet.pitch)),
    )
}

fn set_rotation(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = PlayerRotationPacket::read_from_buffer(reader)?;
    session.move_player(None, Some(rotation_from_degrees(packet.yaw, packet.pitch)))
}

fn player_action(session: &mut Session, reader: &mut MinecraftPacketBuffer, now: Instant) -> Result<()> {
    let packet = PlayerActionPacket::read_from_buffer(reader)?;
    match packet.status {
        DigStatus::Started => session.start_dig(packet.position, now),
        DigStatus::Cancelled => session.cancel_dig(),
        DigStatus::Finished => session.finish_dig(packet.position)?,
        other => {
            log(format!("Ignoring player action {:?}", other), Debug);
            return Ok(());
        }
    }
    session.send(&AcknowledgeBlockChangePacket {
        sequence: packet.sequence,
    })
}

fn set_held_item(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = HeldItemChangePacket::read_from_buffer(reader)?;
    session.select_hotbar(packet.slot)
}

fn set_creative_slot(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = CreativeSlotPacket::read_from_buffer(reader)?;
    session.set_creative_slot(packet.slot, packet.stack)
}

fn use_item_on(session: &mut Session, reader: &mut MinecraftPacketBuffer, _now: Instant) -> Result<()> {
    let packet = UseItemOnPacket::read_from_buffer(reader)?;
    let result = session.use_item_on(packet.position, packet.face);
    // Acknowledged whatever the outcome, so the client drops its prediction
    session.send(&AcknowledgeBlockChangePacket {
        sequence: packet.sequence,
    })?;
    result
}
