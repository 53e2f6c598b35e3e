pub mod flat_world;
pub mod lobby;

pub use flat_world::FlatWorld;
pub use lobby::Lobby;
