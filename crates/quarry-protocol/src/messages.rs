use crate::chat::text_component;
use crate::opcodes::play::{clientbound, serverbound};
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::Result;

/// System Chat Message; `overlay` shows it above the hotbar instead.
pub struct SystemChatPacket {
    pub text: String,
    pub overlay: bool,
}

impl SystemChatPacket {
    pub fn chat(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            overlay: false,
        }
    }

    pub fn action_bar(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            overlay: true,
        }
    }
}

impl Packet for SystemChatPacket {
    fn packet_id() -> i32 {
        clientbound::SYSTEM_CHAT_MESSAGE
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_nbt(&text_component(&self.text))?
            .write_bool(self.overlay);
        Ok(())
    }
}

/// Play-phase disconnect.
pub struct DisconnectPacket {
    pub reason: String,
}

impl Packet for DisconnectPacket {
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

/// Play-phase plugin message; the payload runs to the end of the packet.
pub struct PluginMessagePacket {
    pub channel: String,
    pub data: Vec<u8>,
}

impl Packet for PluginMessagePacket {
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

/// Chat Message. Only the text is read; signing data that follows is ignored.
pub struct ChatMessagePacket {
    pub message: String,
}

impl Packet for ChatMessagePacket {
    fn packet_id() -> i32 {
        serverbound::CHAT_MESSAGE
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        let message = buffer.read_string()?;
        buffer.read_remaining();
        Ok(ChatMessagePacket { message })
    }
}

/// Chat Command, without the leading slash. Argument signatures are ignored.
pub struct ChatCommandPacket {
    pub command: String,
}

impl Packet for ChatCommandPacket {
    fn packet_id() -> i32 {
        serverbound::CHAT_COMMAND
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        let command = buffer.read_string()?;
        buffer.read_remaining();
        Ok(ChatCommandPacket { command })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_nbt::Tag;

    #[test]
    fn test_system_chat_layout() {
        let mut buffer = MinecraftPacketBuffer::new();
        SystemChatPacket::action_bar("&ehi")
            .write_to_buffer(&mut buffer)
            .unwrap();

        let mut read = MinecraftPacketBuffer::from_bytes(buffer.buffer);
        assert_eq!(read.read_varint().unwrap(), 0x69);
        let text = read.read_nbt().unwrap();
        assert_eq!(
            text.as_compound().and_then(|c| c.get("text")).and_then(Tag::as_str),
            Some("§ehi")
        );
        assert!(read.read_bool().unwrap());
    }

    #[test]
    fn test_chat_message_ignores_signature() {
        let mut buffer = MinecraftPacketBuffer::new();
        buffer
            .write_string("hello there")
            .write_i64(1_700_000_000_000)
            .write_i64(99)
            .write_bool(false)
            .write_varint(0)
            .write_bytes(&[0, 0, 0]);

        let packet = ChatMessagePacket::read_from_buffer(&mut buffer).unwrap();
        assert_eq!(packet.message, "hello there");
        assert_eq!(buffer.remaining(), 0);
    }
}
