use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use ballcards_interface::errors::{AppError, Result};

pub type DatabaseConnection = mongodb::Database;

pub const PLAYERS_COLLECTION: &str = "players";

pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn new_pool(database_uri: &str, database_name: &str) -> Result<DatabaseConnection> {
        let db = mongodb::Client::with_uri_str(database_uri)
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?
            .database(database_name);

        db.run_command(doc! {"ping": 1}, None)
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?;

        Self::create_indexes(&db).await?;

        Ok(db)
    }

    // The import upserts players by their external id, it has to be unique
    // for the players that have one.
    async fn create_indexes(db: &DatabaseConnection) -> Result<()> {
        let external_id_index = IndexModel::builder()
            .keys(doc! {"externalId": 1})
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .build(),
            )
            .build();

        db.collection::<mongodb::bson::Document>(PLAYERS_COLLECTION)
            .create_index(external_id_index, None)
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?;

        Ok(())
    }
}
