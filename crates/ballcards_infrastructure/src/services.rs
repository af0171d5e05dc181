use std::sync::Arc;

use axum::extract::FromRef;

use crate::database_connection::{DatabaseConnection, DatabaseManager};
use crate::settings::{Backend, Database};
use ballcards_interface::errors::Result;
use ballcards_interface::players::service::PlayersServiceHandle;

pub mod memory_players_service;
pub mod players_service;

use memory_players_service::MemoryPlayersService;
use players_service::MongoPlayersService;

#[derive(FromRef, Clone)]
pub struct ServiceRegistry {
    pub players_service: PlayersServiceHandle,
}

impl ServiceRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        let players_service = Arc::new(MongoPlayersService::new(db));

        Self { players_service }
    }

    pub fn in_memory() -> Self {
        let players_service = Arc::new(MemoryPlayersService::new());

        Self { players_service }
    }

    /// Build the registry on the configured backend. The mongodb backend is
    /// pinged before being used.
    pub async fn connect(database: &Database) -> Result<Self> {
        match database.backend {
            Backend::Mongodb => {
                let db = DatabaseManager::new_pool(database.uri.as_str(), database.name.as_str())
                    .await?;
                Ok(Self::new(db))
            }
            Backend::Memory => Ok(Self::in_memory()),
        }
    }
}
