use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::players::model::{
    NewPlayer, Player, PlayerChanges, PlayerListing, PlayersPage, UpsertOutcome,
};

#[async_trait]
pub trait PlayersService: Send + Sync {
    // A page of players and the pagination envelope. The total is counted
    // separately from the page window.
    async fn get_players(&self, listing: PlayerListing) -> Result<PlayersPage>;
    async fn get_player(&self, id: &str) -> Result<Player>;
    async fn update_player(&self, id: &str, changes: PlayerChanges) -> Result<Player>;
    async fn upsert_player(&self, player: NewPlayer) -> Result<UpsertOutcome>;
    async fn count_players(&self) -> Result<u64>;

    async fn set_description(&self, id: &str, description: String) -> Result<Player> {
        self.update_player(id, PlayerChanges::description(description))
            .await
    }
}

pub type PlayersServiceHandle = Arc<dyn PlayersService + Send + Sync>;
