//! Packet ids for protocol 765 (1.20.3 / 1.20.4), per phase and direction.

pub const PROTOCOL_VERSION: i32 = 765;
pub const VERSION_NAME: &str = "1.20.4";

pub mod handshake {
    pub const HANDSHAKE: i32 = 0x00;
}

pub mod status {
    pub mod clientbound {
        pub const STATUS_RESPONSE: i32 = 0x00;
        pub const PONG: i32 = 0x01;
    }

    pub mod serverbound {
        pub const STATUS_REQUEST: i32 = 0x00;
        pub const PING: i32 = 0x01;
    }
}

pub mod login {
    pub mod clientbound {
        pub const DISCONNECT: i32 = 0x00;
        pub const LOGIN_SUCCESS: i32 = 0x02;
        pub const SET_COMPRESSION: i32 = 0x03;
    }

    pub mod serverbound {
        pub const LOGIN_START: i32 = 0x00;
        pub const LOGIN_ACKNOWLEDGED: i32 = 0x03;
    }
}

pub mod configuration {
    pub mod clientbound {
        pub const PLUGIN_MESSAGE: i32 = 0x00;
        pub const DISCONNECT: i32 = 0x01;
        pub const FINISH_CONFIGURATION: i32 = 0x02;
        pub const KEEP_ALIVE: i32 = 0x03;
        pub const REGISTRY_DATA: i32 = 0x05;
    }

    pub mod serverbound {
        pub const CLIENT_INFORMATION: i32 = 0x00;
        pub const PLUGIN_MESSAGE: i32 = 0x01;
        pub const ACKNOWLEDGE_FINISH: i32 = 0x02;
        pub const KEEP_ALIVE: i32 = 0x03;
    }
}

pub mod play {
    pub mod clientbound {
        pub const SPAWN_ENTITY: i32 = 0x01;
        pub const ACKNOWLEDGE_BLOCK_CHANGE: i32 = 0x05;
        pub const BLOCK_UPDATE: i32 = 0x09;
        pub const CHUNK_BATCH_FINISHED: i32 = 0x0C;
        pub const CHUNK_BATCH_START: i32 = 0x0D;
        pub const SET_CONTAINER_SLOT: i32 = 0x15;
        pub const PLUGIN_MESSAGE: i32 = 0x18;
        pub const DISCONNECT: i32 = 0x1B;
        pub const GAME_EVENT: i32 = 0x20;
        pub const KEEP_ALIVE: i32 = 0x24;
        pub const CHUNK_DATA_AND_LIGHT: i32 = 0x25;
        pub const WORLD_EVENT: i32 = 0x26;
        pub const LOGIN: i32 = 0x29;
        pub const PLAYER_ABILITIES: i32 = 0x36;
        pub const PLAYER_INFO_REMOVE: i32 = 0x3B;
        pub const PLAYER_INFO_UPDATE: i32 = 0x3C;
        pub const SYNCHRONIZE_PLAYER_POSITION: i32 = 0x3E;
        pub const REMOVE_ENTITIES: i32 = 0x40;
        pub const RESPAWN: i32 = 0x45;
        pub const SET_HEAD_ROTATION: i32 = 0x46;
        pub const SET_HELD_ITEM: i32 = 0x51;
        pub const SET_CENTER_CHUNK: i32 = 0x52;
        pub const SET_RENDER_DISTANCE: i32 = 0x53;
        pub const SET_DEFAULT_SPAWN_POSITION: i32 = 0x54;
        pub const SET_SIMULATION_DISTANCE: i32 = 0x60;
        pub const SYSTEM_CHAT_MESSAGE: i32 = 0x69;
        pub const TAB_LIST_HEADER_FOOTER: i32 = 0x6A;
        pub const TELEPORT_ENTITY: i32 = 0x6D;
    }

    pub mod serverbound {
        pub const CONFIRM_TELEPORTATION: i32 = 0x00;
        pub const CHAT_COMMAND: i32 = 0x04;
        pub const CHAT_MESSAGE: i32 = 0x05;
        pub const CHUNK_BATCH_RECEIVED: i32 = 0x07;
        pub const CLIENT_INFORMATION: i32 = 0x09;
        pub const INTERACT: i32 = 0x13;
        pub const KEEP_ALIVE: i32 = 0x15;
        pub const SET_PLAYER_POSITION: i32 = 0x17;
        pub const SET_PLAYER_POSITION_AND_ROTATION: i32 = 0x18;
        pub const SET_PLAYER_ROTATION: i32 = 0x19;
        pub const PLAYER_ACTION: i32 = 0x21;
        pub const SET_HELD_ITEM: i32 = 0x2C;
        pub const SET_CREATIVE_MODE_SLOT: i32 = 0x2F;
        pub const USE_ITEM_ON: i32 = 0x35;
    }
}

#[cfg(test)]
mod tests {
    use super::play::clientbound;
    use std::collections::HashSet;

    #[test]
    fn test_clientbound_play_ids_are_unique() {
        let ids = [
            clientbound::SPAWN_ENTITY,
            clientbound::ACKNOWLEDGE_BLOCK_CHANGE,
            clientbound::BLOCK_UPDATE,
            clientbound::CHUNK_BATCH_FINISHED,
            clientbound::CHUNK_BATCH_START,
            clientbound::SET_CONTAINER_SLOT,
            clientbound::PLUGIN_MESSAGE,
            clientbound::DISCONNECT,
            clientbound::GAME_EVENT,
            clientbound::KEEP_ALIVE,
            clientbound::CHUNK_DATA_AND_LIGHT,
            clientbound::WORLD_EVENT,
            clientbound::LOGIN,
            clientbound::PLAYER_ABILITIES,
            clientbound::PLAYER_INFO_REMOVE,
            clientbound::PLAYER_INFO_UPDATE,
            clientbound::SYNCHRONIZE_PLAYER_POSITION,
            clientbound::REMOVE_ENTITIES,
            clientbound::RESPAWN,
            clientbound::SET_HEAD_ROTATION,
            clientbound::SET_HELD_ITEM,
            clientbound::SET_CENTER_CHUNK,
            clientbound::SET_RENDER_DISTANCE,
            clientbound::SET_DEFAULT_SPAWN_POSITION,
            clientbound::SET_SIMULATION_DISTANCE,
            clientbound::SYSTEM_CHAT_MESSAGE,
            clientbound::TAB_LIST_HEADER_FOOTER,
            clientbound::TELEPORT_ENTITY,
        ];
        let unique: HashSet<i32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
