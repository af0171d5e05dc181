// Bulk import of the external baseball data set.
//
// Records are processed one by one and upserted by their external id, so
// the import can be run again. A record that fails is counted as skipped and
// does not stop the import.

use serde_json::Value;

use ballcards_interface::errors::{AppError, Result};
use ballcards_interface::players::import::{parse_record, record_name};
use ballcards_interface::players::model::UpsertOutcome;
use ballcards_interface::players::service::PlayersService;

use crate::settings::Backend;

const PROGRESS_INTERVAL: u64 = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl SeedReport {
    pub fn processed(&self) -> u64 {
        self.created + self.updated + self.skipped
    }
}

/// Fetch the raw records. The data set has to be a json array.
pub async fn fetch_records(source_url: &str) -> Result<Vec<Value>> {
    let response = reqwest::get(source_url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| AppError::ReqwestError { msg: e.to_string() })?;

    let payload = response
        .json::<Value>()
        .await
        .map_err(|e| AppError::ParseError { msg: e.to_string() })?;

    match payload {
        Value::Array(records) => Ok(records),
        _ => Err(AppError::ParseError {
            msg: format!("expected a json array of players from {}", source_url),
        }),
    }
}

/// The import only makes sense on a backend that outlives the process.
pub fn ensure_persistent(backend: Backend) -> Result<()> {
    match backend {
        Backend::Mongodb => Ok(()),
        Backend::Memory => Err(AppError::validation(
            "the seed needs a persistent database, database.backend is set to memory",
        )),
    }
}

pub async fn import_players(
    players_service: &(dyn PlayersService + Send + Sync),
    records: &[Value],
) -> SeedReport {
    let mut report = SeedReport::default();

    for record in records {
        let outcome = match parse_record(record) {
            Ok(player) => players_service.upsert_player(player).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(UpsertOutcome::Created) => report.created += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Err(e) => {
                report.skipped += 1;
                let name = record_name(record);
                tracing::warn!(
                    player = name.as_deref().unwrap_or("<unnamed>"),
                    error = %e,
                    "failed to import player"
                );
            }
        }

        if report.processed() % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "progress: {}/{} ({} new, {} updated)",
                report.processed(),
                records.len(),
                report.created,
                report.updated
            );
        }
    }

    report
}

/// Fetch the data set and import every record. Only a failure to fetch the
/// data set is returned as an error.
pub async fn run(
    players_service: &(dyn PlayersService + Send + Sync),
    source_url: &str,
) -> Result<SeedReport> {
    tracing::info!("fetching baseball data from {}", source_url);
    let records = fetch_records(source_url).await?;
    tracing::info!("found {} players", records.len());

    let report = import_players(players_service, &records).await;

    tracing::info!(
        created = report.created,
        updated = report.updated,
        "seed complete"
    );
    if report.skipped > 0 {
        tracing::warn!(skipped = report.skipped, "some players were skipped");
    }

    Ok(report)
}
