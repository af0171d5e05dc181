use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ballcards_interface::errors::{AppError, Result};
use ballcards_interface::players::model::{
    next_updated_at, now_millis, NewPlayer, Player, PlayerChanges, PlayerListing, PlayersPage,
    SortOrder, UpsertOutcome,
};
use ballcards_interface::players::service::PlayersService;

// Players keyed by their sequence number, the decimal form of which is the player id.
#[derive(Default)]
struct MemoryStore {
    last_id: u64,
    players: BTreeMap<u64, Player>,
}

/// Players service keeping every player in memory. Used for local
/// development and by the tests.
#[derive(Clone, Default)]
pub struct MemoryPlayersService {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryPlayersService {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.parse().map_err(|_| AppError::player_not_found(id))
}

// Missing values sort lowest, like a null in mongodb.
fn compare_values(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl PlayersService for MemoryPlayersService {
    async fn get_players(&self, listing: PlayerListing) -> Result<PlayersPage> {
        let store = self.store.read().await;
        let total = store.players.len() as u64;

        // The map iterates by ascending id and the sort is stable, so ties
        // keep the ascending id order.
        let mut players: Vec<&Player> = store.players.values().collect();
        players.sort_by(|a, b| {
            let ordering = compare_values(
                a.sort_value(listing.sort_by),
                b.sort_value(listing.sort_by),
            );
            match listing.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let skip = usize::try_from(listing.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(listing.limit).unwrap_or(usize::MAX);
        let data = players
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|player| Player {
                raw_data: None,
                ..player.clone()
            })
            .collect();

        Ok(PlayersPage::new(&listing, total, data))
    }

    async fn get_player(&self, id: &str) -> Result<Player> {
        let key = parse_id(id)?;
        let store = self.store.read().await;

        store
            .players
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::player_not_found(id))
    }

    async fn update_player(&self, id: &str, changes: PlayerChanges) -> Result<Player> {
        let key = parse_id(id)?;
        let mut store = self.store.write().await;

        let player = store
            .players
            .get_mut(&key)
            .ok_or_else(|| AppError::player_not_found(id))?;

        let updated_at = next_updated_at(player.updated_at, now_millis());
        player.apply(changes, updated_at);

        Ok(player.clone())
    }

    async fn upsert_player(&self, player: NewPlayer) -> Result<UpsertOutcome> {
        let mut store = self.store.write().await;
        let now = now_millis();

        let existing = store
            .players
            .values_mut()
            .find(|p| p.external_id.as_deref() == Some(player.external_id.as_str()));

        if let Some(existing) = existing {
            let updated_at = next_updated_at(existing.updated_at, now);
            player.overwrite(existing, updated_at);
            return Ok(UpsertOutcome::Updated);
        }

        store.last_id += 1;
        let key = store.last_id;
        store
            .players
            .insert(key, player.into_player(key.to_string(), now));

        Ok(UpsertOutcome::Created)
    }

    async fn count_players(&self) -> Result<u64> {
        Ok(self.store.read().await.players.len() as u64)
    }
}
