//! Offline-mode login policy: names are trusted, UUIDs derived from them.

use futures::future::{self, BoxFuture, FutureExt};
use quarry_common::collab::{AuthDecision, Authenticator, LoginRequest, PlayerActions};
use quarry_common::config::ServerConfig;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 16;

/// The UUID an offline-mode player gets for `username`.
pub fn offline_uuid(username: &str) -> Uuid {
    Uuid::new_v3(
        &Uuid::NAMESPACE_DNS,
        format!("OfflinePlayer:{}", username).as_bytes(),
    )
}

pub fn valid_username(username: &str) -> bool {
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct OfflineAuthenticator {
    banned: HashSet<String>,
    max_players: usize,
    players: Arc<dyn PlayerActions>,
}

impl OfflineAuthenticator {
    pub fn new(config: &ServerConfig, players: Arc<dyn PlayerActions>) -> Self {
        Self {
            banned: config
                .banned_names
                .iter()
                .map(|name| name.to_ascii_lowercase())
                .collect(),
            max_players: config.max_players as usize,
            players,
        }
    }

    pub fn decide(&self, request: &LoginRequest) -> AuthDecision {
        let username = request.username.as_str();
        if !valid_username(username) {
            return AuthDecision::Deny(format!("Invalid username: {}", username));
        }
        if self.banned.contains(&username.to_ascii_lowercase()) {
            return AuthDecision::Deny("You are banned from this server".to_owned());
        }

        let uuid = offline_uuid(username);
        // A rejoin replaces the old entry, so it never counts against the limit
        let others = self
            .players
            .online()
            .iter()
            .filter(|player| player.identity.uuid != uuid)
            .count();
        if others >= self.max_players {
            return AuthDecision::Deny("The server is full".to_owned());
        }

        AuthDecision::Allow {
            uuid,
            username: username.to_owned(),
        }
    }
}

impl Authenticator for OfflineAuthenticator {
    fn authenticate(&self, request: LoginRequest) -> BoxFuture<'static, AuthDecision> {
        future::ready(self.decide(&request)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quarry_common::collab::ClientHandle;
    use quarry_common::types::{
        BlockId, BlockPos, PlayerIdentity, PlayerSnapshot, Position, Rotation, WorldBounds,
    };
    use quarry_common::Result;
    use quarry_world::{FlatWorld, Lobby};

    struct Silent;

    impl ClientHandle for Silent {
        fn add_player(&self, _: &PlayerSnapshot) -> Result<()> {
            Ok(())
        }
        fn spawn_player(&self, _: &PlayerSnapshot) -> Result<()> {
            Ok(())
        }
        fn move_player(&self, _: &PlayerSnapshot) -> Result<()> {
            Ok(())
        }
        fn remove_player(&self, _: &PlayerIdentity) -> Result<()> {
            Ok(())
        }
        fn block_changed(&self, _: BlockPos, _: BlockId) -> Result<()> {
            Ok(())
        }
        fn message(&self, _: &str) -> Result<()> {
            Ok(())
        }
        fn disconnect(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    fn request(username: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_owned(),
            claimed_uuid: Uuid::nil(),
            address: "127.0.0.1:40000".parse().unwrap(),
        }
    }

    fn lobby() -> Arc<Lobby> {
        let world = Arc::new(FlatWorld::generate(WorldBounds::new(16, 16, 16), 0));
        Arc::new(Lobby::new(world))
    }

    fn join(lobby: &Lobby, username: &str, entity_id: i32) {
        lobby.join(
            PlayerSnapshot {
                identity: PlayerIdentity {
                    uuid: offline_uuid(username),
                    username: username.to_owned(),
                    entity_id,
                },
                position: Position::default(),
                rotation: Rotation::default(),
            },
            Arc::new(Silent),
        );
    }

    #[test]
    fn test_offline_uuid_is_stable_version_3() {
        let uuid = offline_uuid("Notch");
        assert_eq!(uuid, offline_uuid("Notch"));
        assert_ne!(uuid, offline_uuid("notch"));
        assert_eq!(uuid.get_version_num(), 3);
    }

    #[test]
    fn test_username_rules() {
        assert!(valid_username("Steve_99"));
        assert!(!valid_username("ab"));
        assert!(!valid_username("seventeen_chars__"));
        assert!(!valid_username("bad name"));
        assert!(!valid_username("§cred"));
    }

    #[tokio::test]
    async fn test_allows_valid_name() {
        let auth = OfflineAuthenticator::new(&ServerConfig::default(), lobby());
        let decision = auth.authenticate(request("Steve")).await;
        assert_eq!(
            decision,
            AuthDecision::Allow {
                uuid: offline_uuid("Steve"),
                username: "Steve".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn test_denies_banned_name_case_insensitively() {
        let mut config = ServerConfig::default();
        config.banned_names = vec!["Griefer".to_owned()];
        let auth = OfflineAuthenticator::new(&config, lobby());
        assert_matches!(auth.authenticate(request("griefer")).await, AuthDecision::Deny(_));
    }

    #[test]
    fn test_full_server_still_admits_rejoin() {
        let mut config = ServerConfig::default();
        config.max_players = 1;
        let lobby = lobby();
        join(&lobby, "Alice", 1);
        let auth = OfflineAuthenticator::new(&config, lobby);

        assert_eq!(
            auth.decide(&request("Bob")),
            AuthDecision::Deny("The server is full".to_owned())
        );
        assert_matches!(auth.decide(&request("Alice")), AuthDecision::Allow { .. });
    }
}
