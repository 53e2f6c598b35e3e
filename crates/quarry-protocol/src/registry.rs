//! Registry data sent once during configuration.
//!
//! The client refuses to enter play without the dimension type, biome,
//! chat type and damage type registries. Trim registries may be empty.

use crate::layout::{DimensionLayout, DIMENSION_TYPE};
use quarry_nbt::{Compound, Tag};

pub const PLAINS: &str = "minecraft:plains";

/// Every damage type the 1.20.4 client looks up by key.
const DAMAGE_TYPES: [&str; 44] = [
    "arrow",
    "bad_respawn_point",
    "cactus",
    "cramming",
    "dragon_breath",
    "drown",
    "dry_out",
    "explosion",
    "fall",
    "falling_anvil",
    "falling_block",
    "falling_stalactite",
    "fireball",
    "fireworks",
    "fly_into_wall",
    "freeze",
    "generic",
    "generic_kill",
    "hot_floor",
    "in_fire",
    "in_wall",
    "indirect_magic",
    "lava",
    "lightning_bolt",
    "magic",
    "mob_attack",
    "mob_attack_no_aggro",
    "mob_projectile",
    "on_fire",
    "out_of_world",
    "outside_border",
    "player_attack",
    "player_explosion",
    "sonic_boom",
    "stalagmite",
    "starve",
    "sting",
    "sweet_berry_bush",
    "thorns",
    "thrown",
    "trident",
    "unattributed_fireball",
    "wither",
    "wither_skull",
];

fn registry(kind: &str, entries: Vec<(String, Compound)>) -> Tag {
    let values = entries
        .into_iter()
        .enumerate()
        .map(|(id, (name, element))| {
            Compound::new()
                .with("name", Tag::String(name))
                .with("id", Tag::Int(id as i32))
                .with("element", element.into())
                .into()
        })
        .collect();

    Compound::new()
        .with("type", Tag::String(kind.to_owned()))
        .with("value", Tag::List(values))
        .into()
}

fn dimension_type(layout: &DimensionLayout) -> Compound {
    Compound::new()
        .with("piglin_safe", false.into())
        .with("has_raids", false.into())
        .with("monster_spawn_light_level", Tag::Int(0))
        .with("monster_spawn_block_light_limit", Tag::Int(0))
        .with("natural", true.into())
        .with("ambient_light", Tag::Float(0.0))
        .with("fixed_time", Tag::Long(6000))
        .with("infiniburn", "#minecraft:infiniburn_overworld".into())
        .with("respawn_anchor_works", false.into())
        .with("has_skylight", true.into())
        .with("bed_works", true.into())
        .with("effects", "minecraft:overworld".into())
        .with("min_y", Tag::Int(layout.min_y()))
        .with("height", Tag::Int(layout.height()))
        .with("logical_height", Tag::Int(layout.height()))
        .with("coordinate_scale", Tag::Double(1.0))
        .with("ultrawarm", false.into())
        .with("has_ceiling", false.into())
}

fn plains() -> Compound {
    Compound::new()
        .with("has_precipitation", true.into())
        .with("temperature", Tag::Float(0.8))
        .with("downfall", Tag::Float(0.4))
        .with(
            "effects",
            Compound::new()
                .with("sky_color", Tag::Int(7907327))
                .with("water_fog_color", Tag::Int(329011))
                .with("fog_color", Tag::Int(12638463))
                .with("water_color", Tag::Int(4159204))
                .into(),
        )
}

fn chat_decoration(translation_key: &str) -> Tag {
    Compound::new()
        .with("translation_key", translation_key.into())
        .with(
            "parameters",
            Tag::List(vec!["sender".into(), "content".into()]),
        )
        .into()
}

fn damage_type(name: &str) -> Compound {
    Compound::new()
        .with("message_id", name.into())
        .with("scaling", "when_caused_by_living_non_player".into())
        .with("exhaustion", Tag::Float(0.1))
}

/// The full registry codec for a dimension laid out as `layout`.
pub fn registry_codec(layout: &DimensionLayout) -> Tag {
    let chat = Compound::new()
        .with("chat", chat_decoration("chat.type.text"))
        .with("narration", chat_decoration("chat.type.text.narrate"));

    Compound::new()
        .with(
            "minecraft:dimension_type",
            registry(
                "minecraft:dimension_type",
                vec![(DIMENSION_TYPE.to_owned(), dimension_type(layout))],
            ),
        )
        .with(
            "minecraft:worldgen/biome",
            registry(
                "minecraft:worldgen/biome",
                vec![(PLAINS.to_owned(), plains())],
            ),
        )
        .with(
            "minecraft:chat_type",
            registry("minecraft:chat_type", vec![("minecraft:chat".to_owned(), chat)]),
        )
        .with(
            "minecraft:damage_type",
            registry(
                "minecraft:damage_type",
                DAMAGE_TYPES
                    .iter()
                    .map(|name| (format!("minecraft:{}", name), damage_type(name)))
                    .collect(),
            ),
        )
        .with(
            "minecraft:trim_pattern",
            registry("minecraft:trim_pattern", Vec::new()),
        )
        .with(
            "minecraft:trim_material",
            registry("minecraft:trim_material", Vec::new()),
        )
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::types::WorldBounds;

    fn entries<'a>(codec: &'a Tag, key: &str) -> &'a [Tag] {
        codec
            .as_compound()
            .and_then(|c| c.get(key))
            .and_then(Tag::as_compound)
            .and_then(|c| c.get("value"))
            .and_then(Tag::as_list)
            .unwrap()
    }

    #[test]
    fn test_dimension_matches_layout() {
        let layout = DimensionLayout::new(WorldBounds::new(64, 40, 64));
        let codec = registry_codec(&layout);
        let dimension = &entries(&codec, "minecraft:dimension_type")[0];
        let element = dimension
            .as_compound()
            .and_then(|c| c.get("element"))
            .and_then(Tag::as_compound)
            .unwrap();

        assert_eq!(element.get("min_y"), Some(&Tag::Int(-16)));
        assert_eq!(element.get("height"), Some(&Tag::Int(80)));
        assert_eq!(element.get("coordinate_scale"), Some(&Tag::Double(1.0)));
    }

    #[test]
    fn test_plains_is_first_biome() {
        let codec = registry_codec(&DimensionLayout::new(WorldBounds::new(16, 16, 16)));
        let biome = entries(&codec, "minecraft:worldgen/biome")[0]
            .as_compound()
            .unwrap();
        assert_eq!(biome.get("name").and_then(Tag::as_str), Some(PLAINS));
        assert_eq!(biome.get("id"), Some(&Tag::Int(0)));
    }

    #[test]
    fn test_damage_types_are_numbered() {
        let codec = registry_codec(&DimensionLayout::new(WorldBounds::new(16, 16, 16)));
        let damage = entries(&codec, "minecraft:damage_type");
        assert_eq!(damage.len(), DAMAGE_TYPES.len());
        let last = damage[43].as_compound().unwrap();
        assert_eq!(last.get("id"), Some(&Tag::Int(43)));
        assert_eq!(last.get("name").and_then(Tag::as_str), Some("minecraft:wither_skull"));
    }

    #[test]
    fn test_codec_encodes() {
        let codec = registry_codec(&DimensionLayout::new(WorldBounds::new(16, 16, 16)));
        let mut bytes = Vec::new();
        codec.write_network(&mut bytes).unwrap();
        let decoded = Tag::read_network(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, codec);
    }
}
