//! Translation between the world model's block ids and protocol 765
//! block-state and item ids. The table is generated from `blocks.json`.

use once_cell::sync::Lazy;
use quarry_common::types::BlockId;

include!(concat!(env!("OUT_DIR"), "/block_table.rs"));

static STATE_BY_BLOCK: Lazy<[i32; 256]> = Lazy::new(|| {
    let mut table = [BOUNDARY_STATE; 256];
    for &(block, state, _) in BLOCK_STATES {
        table[block as usize] = state;
    }
    table
});

/// Block-state id for an internal block. Unmapped ids become the boundary state.
pub fn state_for(block: BlockId) -> i32 {
    STATE_BY_BLOCK[block as usize]
}

/// Internal block for a block-state id, preferring the first listed match.
pub fn block_for_state(state: i32) -> Option<BlockId> {
    BLOCK_STATES
        .iter()
        .find(|(_, candidate, _)| *candidate == state)
        .map(|(block, _, _)| *block)
}

pub fn is_known(block: BlockId) -> bool {
    BLOCK_STATES.iter().any(|(candidate, _, _)| *candidate == block)
}

pub fn name_of(block: BlockId) -> Option<&'static str> {
    BLOCK_STATES
        .iter()
        .find(|(candidate, _, _)| *candidate == block)
        .map(|(_, _, name)| *name)
}

/// The block an item places, if it places one.
pub fn block_for_item(item: i32) -> Option<BlockId> {
    ITEM_BLOCKS
        .iter()
        .find(|(candidate, _)| *candidate == item)
        .map(|(_, block)| *block)
}

pub fn item_for_block(block: BlockId) -> Option<i32> {
    ITEM_BLOCKS
        .iter()
        .find(|(_, candidate)| *candidate == block)
        .map(|(item, _)| *item)
}
