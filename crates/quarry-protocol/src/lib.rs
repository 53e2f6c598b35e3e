pub mod bit_array;
pub mod block_update;
pub mod blocks;
pub mod chat;
pub mod chunk_data;
pub mod configuration;
pub mod entity;
pub mod frame;
pub mod handlers;
pub mod handshake;
pub mod inventory;
pub mod join;
pub mod join_game;
pub mod keep_alive;
pub mod layout;
pub mod login;
pub mod messages;
pub mod opcodes;
pub mod packet;
pub mod peer;
pub mod player_action;
pub mod player_info;
pub mod player_position_and_look;
pub mod registry;
pub mod section;
pub mod session;
pub mod status;
pub mod transport;
pub mod view;

// Re-export commonly used items
pub use packet::{encode_packet, MinecraftPacketBuffer, Packet};
pub use session::{ServerContext, Session, SessionState};
pub use transport::{ChannelTransport, Transport};
