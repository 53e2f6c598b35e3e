use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct Block {
    id: u8,
    name: String,
    state: i32,
    item: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct BlockTable {
    boundary: String,
    blocks: Vec<Block>,
}

fn main() {
    let blocks_json_path = "blocks.json";
    let blocks_json = fs::read_to_string(blocks_json_path).expect("Failed to read blocks.json");

    let table: BlockTable =
        serde_json::from_str(&blocks_json).expect("Failed to parse blocks.json");

    let mut seen = HashSet::new();
    for block in &table.blocks {
        assert!(seen.insert(block.id), "duplicate block id {}", block.id);
    }

    let boundary = table
        .blocks
        .iter()
        .find(|block| block.name == table.boundary)
        .expect("boundary block is not listed in blocks.json");

    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("block_table.rs");
    let mut out_file = File::create(&dest_path).expect("Failed to create block_table.rs");

    writeln!(
        &mut out_file,
        "pub const BOUNDARY_BLOCK: BlockId = {};",
        boundary.id
    )
    .unwrap();
    writeln!(
        &mut out_file,
        "pub const BOUNDARY_STATE: i32 = {};",
        boundary.state
    )
    .unwrap();

    writeln!(
        &mut out_file,
        "pub static BLOCK_STATES: &[(BlockId, i32, &str)] = &["
    )
    .unwrap();
    for block in &table.blocks {
        writeln!(
            &mut out_file,
            "    ({}, {}, {:?}),",
            block.id, block.state, block.name
        )
        .unwrap();
    }
    writeln!(&mut out_file, "];").unwrap();

    writeln!(&mut out_file, "pub static ITEM_BLOCKS: &[(i32, BlockId)] = &[").unwrap();
    for block in &table.blocks {
        if let Some(item) = block.item {
            writeln!(&mut out_file, "    ({}, {}),", item, block.id).unwrap();
        }
    }
    writeln!(&mut out_file, "];").unwrap();

    println!("cargo:rerun-if-changed={}", blocks_json_path);
}
