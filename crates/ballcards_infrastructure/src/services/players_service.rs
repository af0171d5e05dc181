use async_trait::async_trait;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions};
use mongodb::Collection;
use serde::Deserialize;
use serde_json::Value;

use ballcards_interface::errors::{AppError, Result};
use ballcards_interface::players::model::{
    NewPlayer, Player, PlayerChanges, PlayerListing, PlayersPage, SortOrder, UpsertOutcome,
};
use ballcards_interface::players::service::PlayersService;

use crate::database_connection::{DatabaseConnection, PLAYERS_COLLECTION};

// A player as stored in the players collection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub external_id: Option<String>,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub position: Option<String>,
    pub hits: u32,
    pub home_runs: u32,
    pub average: f64,
    #[serde(default)]
    pub at_bats: Option<u32>,
    #[serde(default)]
    pub runs: Option<u32>,
    #[serde(default)]
    pub rbi: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub raw_data: Option<Value>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl From<PlayerDocument> for Player {
    fn from(document: PlayerDocument) -> Self {
        Player {
            id: document.id.to_hex(),
            external_id: document.external_id,
            name: document.name,
            team: document.team,
            position: document.position,
            hits: document.hits,
            home_runs: document.home_runs,
            average: document.average,
            at_bats: document.at_bats,
            runs: document.runs,
            rbi: document.rbi,
            description: document.description,
            raw_data: document.raw_data,
            created_at: to_chrono(document.created_at),
            updated_at: to_chrono(document.updated_at),
        }
    }
}

fn to_chrono(date: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(date.timestamp_millis()).unwrap_or_default()
}

fn optional_count(value: Option<u32>) -> Bson {
    value.map_or(Bson::Null, |v| Bson::Int64(i64::from(v)))
}

// Values written by an update pipeline are expressions: a string starting
// with `$` would be read as a field path, so text and documents go through
// `$literal`.
fn literal(value: impl Into<Bson>) -> Document {
    doc! {"$literal": value.into()}
}

fn optional_literal(value: Option<&str>) -> Bson {
    value.map_or(Bson::Null, |v| Bson::Document(literal(v)))
}

/// `updatedAt` as computed by the server when the update is applied: now,
/// or one millisecond after the stored value if the clock has not moved past
/// it. A document without `updatedAt` gets now.
pub fn next_updated_at_expression() -> Document {
    doc! {"$max": ["$$NOW", {"$add": ["$updatedAt", 1_i64]}]}
}

/// Sort on the requested field, ties are broken by ascending `_id` so that
/// the pages are stable.
pub fn sort_document(listing: &PlayerListing) -> Document {
    let sort_field = listing.sort_by.as_str();
    let sort_value = match listing.order {
        SortOrder::Asc => 1,
        SortOrder::Desc => -1,
    };
    doc! { sort_field: sort_value, "_id": 1 }
}

/// Window of the listing query. The raw data is only returned by the single
/// player lookup.
pub fn listing_options(listing: &PlayerListing) -> FindOptions {
    // The server refuses a skip that does not fit in a signed 64 bits integer.
    let skip = listing.offset().min(i64::MAX as u64);

    FindOptions::builder()
        .sort(sort_document(listing))
        .skip(Some(skip))
        .limit(listing.limit as i64)
        .projection(doc! {"rawData": 0})
        .build()
}

/// Update pipeline merging the given changes. The timestamp is derived from
/// the stored one in the same statement.
pub fn changes_pipeline(changes: &PlayerChanges) -> Vec<Document> {
    let mut fields = doc! {"updatedAt": next_updated_at_expression()};

    if let Some(name) = &changes.name {
        fields.insert("name", literal(name.as_str()));
    }
    if let Some(team) = &changes.team {
        fields.insert("team", literal(team.as_str()));
    }
    if let Some(position) = &changes.position {
        fields.insert("position", literal(position.as_str()));
    }
    if let Some(hits) = changes.hits {
        fields.insert("hits", i64::from(hits));
    }
    if let Some(home_runs) = changes.home_runs {
        fields.insert("homeRuns", i64::from(home_runs));
    }
    if let Some(average) = changes.average {
        fields.insert("average", average);
    }
    if let Some(at_bats) = changes.at_bats {
        fields.insert("atBats", i64::from(at_bats));
    }
    if let Some(runs) = changes.runs {
        fields.insert("runs", i64::from(runs));
    }
    if let Some(rbi) = changes.rbi {
        fields.insert("rbi", i64::from(rbi));
    }
    if let Some(description) = &changes.description {
        fields.insert("description", literal(description.as_str()));
    }

    vec![doc! {"$set": fields}]
}

/// Upsert pipeline of an imported player. Every imported field is
/// overwritten, the creation date is only written on insert.
pub fn import_pipeline(player: &NewPlayer) -> Result<Vec<Document>> {
    let raw_data = match &player.raw_data {
        Some(raw_data) => Bson::Document(literal(
            bson::to_bson(raw_data).map_err(|e| AppError::BsonError { msg: e.to_string() })?,
        )),
        None => Bson::Null,
    };

    Ok(vec![doc! {
        "$set": {
            "externalId": literal(player.external_id.as_str()),
            "name": literal(player.name.as_str()),
            "team": literal(player.team.as_str()),
            "position": optional_literal(player.position.as_deref()),
            "hits": i64::from(player.hits),
            "homeRuns": i64::from(player.home_runs),
            "average": player.average,
            "atBats": optional_count(player.at_bats),
            "runs": optional_count(player.runs),
            "rbi": optional_count(player.rbi),
            "rawData": raw_data,
            "createdAt": {"$ifNull": ["$createdAt", "$$NOW"]},
            "updatedAt": next_updated_at_expression(),
        },
    }])
}

#[derive(Clone)]
pub struct MongoPlayersService {
    db: DatabaseConnection,
}

impl MongoPlayersService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn players(&self) -> Collection<PlayerDocument> {
        self.db.collection::<PlayerDocument>(PLAYERS_COLLECTION)
    }
}

#[async_trait]
impl PlayersService for MongoPlayersService {
    async fn get_players(&self, listing: PlayerListing) -> Result<PlayersPage> {
        let total = self.count_players().await?;

        let players: Vec<PlayerDocument> = self
            .players()
            .find(doc! {}, listing_options(&listing))
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?
            .try_collect()
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?;

        Ok(PlayersPage::new(
            &listing,
            total,
            players.into_iter().map(Player::from).collect(),
        ))
    }

    async fn get_player(&self, id: &str) -> Result<Player> {
        // An id that is not an object id can't match any player.
        let object_id = ObjectId::parse_str(id).map_err(|_| AppError::player_not_found(id))?;

        let player = self
            .players()
            .find_one(doc! {"_id": object_id}, None)
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?;

        player
            .map(Player::from)
            .ok_or_else(|| AppError::player_not_found(id))
    }

    async fn update_player(&self, id: &str, changes: PlayerChanges) -> Result<Player> {
        let object_id = ObjectId::parse_str(id).map_err(|_| AppError::player_not_found(id))?;

        let find_one_and_update_options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.players()
            .find_one_and_update(
                doc! {"_id": object_id},
                changes_pipeline(&changes),
                find_one_and_update_options,
            )
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?
            .map(Player::from)
            .ok_or_else(|| AppError::player_not_found(id))
    }

    async fn upsert_player(&self, player: NewPlayer) -> Result<UpsertOutcome> {
        let update_options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .players()
            .update_one(
                doc! {"externalId": player.external_id.as_str()},
                import_pipeline(&player)?,
                update_options,
            )
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })?;

        Ok(match result.upserted_id {
            Some(_) => UpsertOutcome::Created,
            None => UpsertOutcome::Updated,
        })
    }

    async fn count_players(&self) -> Result<u64> {
        self.players()
            .count_documents(doc! {}, None)
            .await
            .map_err(|e| AppError::MongoError { msg: e.to_string() })
    }
}
