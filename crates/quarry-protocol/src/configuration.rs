use crate::chat::text_component;
use crate::opcodes::configuration::{clientbound, serverbound};
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::Result;
use quarry_nbt::Tag;

pub const BRAND_CHANNEL: &str = "minecraft:brand";

/// Configuration-phase plugin message.
pub struct ConfigPluginMessagePacket {
    pub channel: String,
    pub data: Vec<u8>,
}

impl ConfigPluginMessagePacket {
    /// The `minecraft:brand` message naming the server software.
    pub fn brand(brand: &str) -> Self {
        let mut data = MinecraftPacketBuffer::new();
        data.write_string(brand);
        Self {
            channel: BRAND_CHANNEL.to_owned(),
            data: data.buffer,
        }
    }
}

impl Packet for ConfigPluginMessagePacket {
    fn packet_id() -> i32 {
        clientbound::PLUGIN_MESSAGE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_string(&self.channel)
            .write_bytes(&self.data);
        Ok(())
    }
}

pub struct RegistryDataPacket {
    pub codec: Tag,
}

impl Packet for RegistryDataPacket {
    fn packet_id() -> i32 {
        clientbound::REGISTRY_DATA
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer.write_varint(Self::packet_id()).write_nbt(&self.codec)?;
        Ok(())
    }
}

pub struct FinishConfigurationPacket;

impl Packet for FinishConfigurationPacket {
    fn packet_id() -> i32 {
        clientbound::FINISH_CONFIGURATION
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer.write_varint(Self::packet_id());
        Ok(())
    }
}

pub struct ConfigDisconnectPacket {
    pub reason: String,
}

impl Packet for ConfigDisconnectPacket {
    fn packet_id() -> i32 {
        clientbound::DISCONNECT
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_nbt(&text_component(&self.reason))?;
        Ok(())
    }
}

/// Client Information, sent in configuration and again in play.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInformationPacket {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: i32,
    pub chat_colors: bool,
    pub displayed_skin_parts: u8,
    pub main_hand: i32,
    pub text_filtering: bool,
    pub allow_server_listings: bool,
}

impl Packet for ClientInformationPacket {
    fn packet_id() -> i32 {
        serverbound::CLIENT_INFORMATION
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(ClientInformationPacket {
            locale: buffer.read_string()?,
            view_distance: buffer.read_i8()?,
            chat_mode: buffer.read_varint()?,
            chat_colors: buffer.read_bool()?,
            displayed_skin_parts: buffer.read_u8()?,
            main_hand: buffer.read_varint()?,
            text_filtering: buffer.read_bool()?,
            allow_server_listings: buffer.read_bool()?,
        })
    }
}
