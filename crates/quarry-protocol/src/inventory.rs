//! Player inventory slots and the packets that carry them.

use crate::opcodes::play::{clientbound, serverbound};
use crate::packet::{MinecraftPacketBuffer, Packet};
use quarry_common::{QuarryError, Result};
use quarry_nbt::Tag;

/// Slots in the player inventory window (crafting, armour, main, hotbar, offhand).
pub const INVENTORY_SLOTS: usize = 46;
/// Window slot of the first hotbar entry.
pub const HOTBAR_START: usize = 36;
pub const HOTBAR_SLOTS: usize = 9;
/// Window id of the player inventory.
pub const PLAYER_WINDOW: i8 = 0;

/// A non-empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStack {
    pub item: i32,
    pub count: i8,
}

pub fn write_slot(buffer: &mut MinecraftPacketBuffer, slot: Option<ItemStack>) -> Result<()> {
    match slot {
        Some(stack) => {
            buffer
                .write_bool(true)
                .write_varint(stack.item)
                .write_i8(stack.count)
                .write_nbt(&Tag::End)?;
        }
        None => {
            buffer.write_bool(false);
        }
    }
    Ok(())
}

/// Reads a slot, discarding any item tag.
pub fn read_slot(buffer: &mut MinecraftPacketBuffer) -> Result<Option<ItemStack>> {
    if !buffer.read_bool()? {
        return Ok(None);
    }
    let item = buffer.read_varint()?;
    let count = buffer.read_i8()?;
    buffer.read_nbt()?;
    Ok((count > 0).then_some(ItemStack { item, count }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: [Option<ItemStack>; INVENTORY_SLOTS],
    selected: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            slots: [None; INVENTORY_SLOTS],
            selected: 0,
        }
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> Option<ItemStack> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) -> Result<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| QuarryError::protocol(format!("Slot {} out of range", slot)))?;
        *entry = stack;
        Ok(())
    }

    /// Hotbar index (0..9) of the held item.
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, hotbar_index: usize) -> Result<()> {
        if hotbar_index >= HOTBAR_SLOTS {
            return Err(QuarryError::protocol(format!(
                "Hotbar slot {} out of range",
                hotbar_index
            )));
        }
        self.selected = hotbar_index;
        Ok(())
    }

    pub fn held(&self) -> Option<ItemStack> {
        self.get(HOTBAR_START + self.selected)
    }

    /// Occupied slots in window order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, ItemStack)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, stack)| stack.map(|stack| (slot, stack)))
    }
}

pub struct SetContainerSlotPacket {
    pub window_id: i8,
    pub state_id: i32,
    pub slot: i16,
    pub stack: Option<ItemStack>,
}

impl Packet for SetContainerSlotPacket {
    fn packet_id() -> i32 {
        clientbound::SET_CONTAINER_SLOT
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer
            .write_varint(Self::packet_id())
            .write_i8(self.window_id)
            .write_varint(self.state_id)
            .write_i16(self.slot);
        write_slot(buffer, self.stack)
    }
}

/// Clientbound Set Held Item.
pub struct SetHeldItemPacket {
    pub slot: i8,
}

impl Packet for SetHeldItemPacket {
    fn packet_id() -> i32 {
        clientbound::SET_HELD_ITEM
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> Result<()> {
        buffer.write_varint(Self::packet_id()).write_i8(self.slot);
        Ok(())
    }
}

/// Serverbound Set Held Item.
pub struct HeldItemChangePacket {
    pub slot: i16,
}

impl Packet for HeldItemChangePacket {
    fn packet_id() -> i32 {
        serverbound::SET_HELD_ITEM
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(HeldItemChangePacket {
            slot: buffer.read_i16()?,
        })
    }
}

/// Set Creative Mode Slot. `slot` is -1 when the stack is dropped.
pub struct CreativeSlotPacket {
    pub slot: i16,
    pub stack: Option<ItemStack>,
}

impl Packet for CreativeSlotPacket {
    fn packet_id() -> i32 {
        serverbound::SET_CREATIVE_MODE_SLOT
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> Result<Self> {
        Ok(CreativeSlotPacket {
            slot: buffer.read_i16()?,
            stack: read_slot(buffer)?,
        })
    }
}
