use std::sync::Arc;

use storage::repository::KeyValueStore;

use crate::error::PlayerError;

/// Key of the persisted display name.
pub const PLAYER_KEY: &str = "quizUser";

/// Stores the player's display name between login and results.
#[derive(Clone)]
pub struct PlayerService {
    kv: Arc<dyn KeyValueStore>,
}

impl PlayerService {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Record `name` as the current player.
    ///
    /// The name is stored as entered; it is only checked for being blank.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::EmptyName` for blank input (nothing is stored),
    /// or `PlayerError::Storage` if persistence fails.
    pub async fn login(&self, name: &str) -> Result<(), PlayerError> {
        if name.trim().is_empty() {
            return Err(PlayerError::EmptyName);
        }
        self.kv.set(PLAYER_KEY, name).await?;
        log::info!("player logged in");
        Ok(())
    }

    /// The last name passed to `login`, if any.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Storage` if the backend cannot be read.
    pub async fn display_name(&self) -> Result<Option<String>, PlayerError> {
        Ok(self.kv.get(PLAYER_KEY).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryStore;

    #[tokio::test]
    async fn login_stores_raw_name() {
        let players = PlayerService::new(Arc::new(InMemoryStore::new()));
        players.login("  Budi ").await.unwrap();
        assert_eq!(players.display_name().await.unwrap().as_deref(), Some("  Budi "));
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_state_change() {
        let players = PlayerService::new(Arc::new(InMemoryStore::new()));
        players.login("Ani").await.unwrap();

        let err = players.login("   ").await.unwrap_err();
        assert!(matches!(err, PlayerError::EmptyName));
        assert_eq!(players.display_name().await.unwrap().as_deref(), Some("Ani"));
    }

    #[tokio::test]
    async fn display_name_absent_before_login() {
        let players = PlayerService::new(Arc::new(InMemoryStore::new()));
        assert!(players.display_name().await.unwrap().is_none());
    }
}
