use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, Result};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

// A player as stored and returned by the api.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub external_id: Option<String>, // Key used by the bulk import.
    pub name: String,
    pub team: String,
    pub position: Option<String>,
    pub hits: u32,
    pub home_runs: u32,
    pub average: f64,
    pub at_bats: Option<u32>,
    pub runs: Option<u32>,
    pub rbi: Option<u32>,
    pub description: Option<String>,
    // Source record from the import, only returned when fetching a single player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// Value of the given sort field, absent optional stats sort lowest.
    pub fn sort_value(&self, field: SortField) -> Option<f64> {
        match field {
            SortField::Hits => Some(f64::from(self.hits)),
            SortField::HomeRuns => Some(f64::from(self.home_runs)),
            SortField::Average => Some(self.average),
            SortField::AtBats => self.at_bats.map(f64::from),
            SortField::Runs => self.runs.map(f64::from),
            SortField::Rbi => self.rbi.map(f64::from),
        }
    }

    /// Merge the changes onto the player. Fields absent from the changes are kept.
    pub fn apply(&mut self, changes: PlayerChanges, updated_at: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(team) = changes.team {
            self.team = team;
        }
        if let Some(position) = changes.position {
            self.position = Some(position);
        }
        if let Some(hits) = changes.hits {
            self.hits = hits;
        }
        if let Some(home_runs) = changes.home_runs {
            self.home_runs = home_runs;
        }
        if let Some(average) = changes.average {
            self.average = average;
        }
        if let Some(at_bats) = changes.at_bats {
            self.at_bats = Some(at_bats);
        }
        if let Some(runs) = changes.runs {
            self.runs = Some(runs);
        }
        if let Some(rbi) = changes.rbi {
            self.rbi = Some(rbi);
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        self.updated_at = updated_at;
    }

    // Placeholder text until the description comes from an AI agent.
    pub fn placeholder_description(&self) -> String {
        format!(
            "{} is an exceptional player for the {}. With {} hits and {} home runs, they maintain an impressive {:.3} batting average.",
            self.name, self.team, self.hits, self.home_runs, self.average
        )
    }
}

/// Current time truncated to the millisecond, the precision kept by the store.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// The `updatedAt` to write on a mutation. It is always strictly after the
/// previous one, even when two mutations land in the same millisecond.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + Duration::milliseconds(1))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Hits,
    HomeRuns,
    Average,
    AtBats,
    Runs,
    Rbi,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Hits,
        SortField::HomeRuns,
        SortField::Average,
        SortField::AtBats,
        SortField::Runs,
        SortField::Rbi,
    ];

    // Name of the field in the api and in the players collection.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Hits => "hits",
            SortField::HomeRuns => "homeRuns",
            SortField::Average => "average",
            SortField::AtBats => "atBats",
            SortField::Runs => "runs",
            SortField::Rbi => "rbi",
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| {
                let expected: Vec<&str> = SortField::ALL.iter().map(|f| f.as_str()).collect();
                AppError::validation(format!(
                    "invalid sortBy '{}', expected one of: {}",
                    value,
                    expected.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::validation(format!(
                "invalid order '{}', expected one of: asc, desc",
                value
            ))),
        }
    }
}

// Query string of the players listing. Every value arrives as a string and
// is coerced by `validate`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPlayersQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl GetPlayersQuery {
    pub fn validate(self) -> Result<PlayerListing> {
        let sort_by = match self.sort_by.as_deref() {
            Some(value) => value.parse()?,
            None => SortField::default(),
        };
        let order = match self.order.as_deref() {
            Some(value) => value.parse()?,
            None => SortOrder::default(),
        };

        let page = match self.page.as_deref() {
            Some(raw) => coerce_integer("page", raw)?,
            None => DEFAULT_PAGE as i64,
        };
        if page < 1 {
            return Err(AppError::validation("page must be greater than or equal to 1"));
        }

        let limit = match self.limit.as_deref() {
            Some(raw) => coerce_integer("limit", raw)?,
            None => DEFAULT_LIMIT as i64,
        };
        if limit < 1 || limit > MAX_LIMIT as i64 {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        Ok(PlayerListing {
            sort_by,
            order,
            page: page as u64,
            limit: limit as u64,
        })
    }
}

fn coerce_integer(field: &str, raw: &str) -> Result<i64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::validation(format!("{} must be a number, got '{}'", field, raw)))?;

    if !value.is_finite() || value.fract() != 0.0 {
        return Err(AppError::validation(format!(
            "{} must be an integer, got '{}'",
            field, raw
        )));
    }

    // 2^63 and above do not fit, the cast would saturate.
    if value >= i64::MAX as f64 || value < i64::MIN as f64 {
        return Err(AppError::validation(format!(
            "{} is out of range, got '{}'",
            field, raw
        )));
    }

    Ok(value as i64)
}

/// A validated listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerListing {
    pub sort_by: SortField,
    pub order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl Default for PlayerListing {
    fn default() -> Self {
        Self {
            sort_by: SortField::default(),
            order: SortOrder::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PlayerListing {
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayersPage {
    pub data: Vec<Player>,
    pub pagination: Pagination,
}

impl PlayersPage {
    pub fn new(listing: &PlayerListing, total: u64, data: Vec<Player>) -> Self {
        Self {
            data,
            pagination: Pagination::new(listing.page, listing.limit, total),
        }
    }
}

// payload of a partial player update. Integers are read as i64 so that a
// negative value is reported by `validate` rather than by the json parser.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    pub name: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub hits: Option<i64>,
    pub home_runs: Option<i64>,
    pub average: Option<f64>,
    pub at_bats: Option<i64>,
    pub runs: Option<i64>,
    pub rbi: Option<i64>,
    pub description: Option<String>,
}

impl UpdatePlayerRequest {
    pub fn validate(self) -> Result<PlayerChanges> {
        Ok(PlayerChanges {
            name: self.name.map(|v| required_text("name", v)).transpose()?,
            team: self.team.map(|v| required_text("team", v)).transpose()?,
            position: self.position,
            hits: self.hits.map(|v| stat_count("hits", v)).transpose()?,
            home_runs: self.home_runs.map(|v| stat_count("homeRuns", v)).transpose()?,
            average: self.average.map(batting_average).transpose()?,
            at_bats: self.at_bats.map(|v| stat_count("atBats", v)).transpose()?,
            runs: self.runs.map(|v| stat_count("runs", v)).transpose()?,
            rbi: self.rbi.map(|v| stat_count("rbi", v)).transpose()?,
            description: self.description,
        })
    }
}

/// Validated sparse set of fields to merge onto a player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerChanges {
    pub name: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub hits: Option<u32>,
    pub home_runs: Option<u32>,
    pub average: Option<f64>,
    pub at_bats: Option<u32>,
    pub runs: Option<u32>,
    pub rbi: Option<u32>,
    pub description: Option<String>,
}

impl PlayerChanges {
    pub fn description(description: String) -> Self {
        Self {
            description: Some(description),
            ..Default::default()
        }
    }
}

/// A player produced by the bulk import, inserted or updated by `external_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    pub external_id: String,
    pub name: String,
    pub team: String,
    pub position: Option<String>,
    pub hits: u32,
    pub home_runs: u32,
    pub average: f64,
    pub at_bats: Option<u32>,
    pub runs: Option<u32>,
    pub rbi: Option<u32>,
    pub raw_data: Option<Value>,
}

impl NewPlayer {
    pub fn into_player(self, id: String, created_at: DateTime<Utc>) -> Player {
        Player {
            id,
            external_id: Some(self.external_id),
            name: self.name,
            team: self.team,
            position: self.position,
            hits: self.hits,
            home_runs: self.home_runs,
            average: self.average,
            at_bats: self.at_bats,
            runs: self.runs,
            rbi: self.rbi,
            description: None,
            raw_data: self.raw_data,
            created_at,
            updated_at: created_at,
        }
    }

    // Overwrite the imported fields of an existing player. The description
    // is not part of the import and is kept.
    pub fn overwrite(self, player: &mut Player, updated_at: DateTime<Utc>) {
        player.name = self.name;
        player.team = self.team;
        player.position = self.position;
        player.hits = self.hits;
        player.home_runs = self.home_runs;
        player.average = self.average;
        player.at_bats = self.at_bats;
        player.runs = self.runs;
        player.rbi = self.rbi;
        player.raw_data = self.raw_data;
        player.updated_at = updated_at;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DescriptionResponse {
    pub description: String,
}

pub(crate) fn required_text(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} must not be empty", field)));
    }
    Ok(value)
}

pub(crate) fn stat_count(field: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        AppError::validation(format!(
            "{} must be a non-negative integer, got {}",
            field, value
        ))
    })
}

pub(crate) fn batting_average(value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::validation(format!(
            "average must be between 0 and 1, got {}",
            value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(sort_by: Option<&str>, order: Option<&str>, page: Option<&str>, limit: Option<&str>) -> GetPlayersQuery {
        GetPlayersQuery {
            sort_by: sort_by.map(String::from),
            order: order.map(String::from),
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    fn player() -> Player {
        let created_at = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();
        Player {
            id: "1".to_string(),
            external_id: Some("Mike-Trout-CF".to_string()),
            name: "Mike Trout".to_string(),
            team: "Los Angeles Angels".to_string(),
            position: Some("CF".to_string()),
            hits: 185,
            home_runs: 40,
            average: 0.305,
            at_bats: Some(606),
            runs: Some(110),
            rbi: None,
            description: None,
            raw_data: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn listing_defaults_to_hits_descending() {
        let listing = GetPlayersQuery::default().validate().unwrap();
        assert_eq!(listing, PlayerListing::default());
        assert_eq!(listing.sort_by, SortField::Hits);
        assert_eq!(listing.order, SortOrder::Desc);
        assert_eq!(listing.page, 1);
        assert_eq!(listing.limit, 20);
        assert_eq!(listing.offset(), 0);
    }

    #[test]
    fn listing_parses_every_sort_field() {
        for field in SortField::ALL {
            let listing = query(Some(field.as_str()), Some("asc"), None, None)
                .validate()
                .unwrap();
            assert_eq!(listing.sort_by, field);
            assert_eq!(listing.order, SortOrder::Asc);
        }
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let error = query(Some("salary"), None, None, None).validate().unwrap_err();
        assert!(matches!(error, AppError::ValidationError { .. }));
        assert!(error.to_string().contains("salary"));

        // Names are case sensitive.
        assert!(query(Some("HomeRuns"), None, None, None).validate().is_err());
        assert!(query(None, Some("DESC"), None, None).validate().is_err());
    }

    #[test]
    fn page_and_limit_are_coerced_from_strings() {
        let listing = query(None, None, Some(" 3 "), Some("2.0")).validate().unwrap();
        assert_eq!(listing.page, 3);
        assert_eq!(listing.limit, 2);
        assert_eq!(listing.offset(), 4);

        let listing = query(None, None, None, Some("1e1")).validate().unwrap();
        assert_eq!(listing.limit, 10);
    }

    #[test]
    fn out_of_range_limit_is_rejected_not_clamped() {
        for limit in ["0", "101", "-1"] {
            let error = query(None, None, None, Some(limit)).validate().unwrap_err();
            assert!(matches!(error, AppError::ValidationError { .. }), "limit {limit}");
        }
        assert_eq!(
            query(None, None, None, Some("100")).validate().unwrap().limit,
            100
        );
        assert_eq!(query(None, None, None, Some("1")).validate().unwrap().limit, 1);
    }

    #[test]
    fn malformed_page_is_rejected() {
        for page in ["0", "-2", "1.5", "two", "", "NaN", "inf"] {
            assert!(
                query(None, None, Some(page), None).validate().is_err(),
                "page {page:?}"
            );
        }
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        for page in ["1e30", "9223372036854775808", "-1e30"] {
            let error = query(None, None, Some(page), Some("100"))
                .validate()
                .unwrap_err();
            assert_eq!(error.kind(), "ValidationError", "page {page:?}");
        }
    }

    #[test]
    fn large_page_does_not_overflow_the_offset() {
        let listing = query(None, None, Some("1e18"), Some("100")).validate().unwrap();
        assert_eq!(listing.page, 1_000_000_000_000_000_000);
        assert_eq!(listing.offset(), u64::MAX);
    }

    #[test]
    fn pagination_with_no_rows() {
        let pagination = Pagination::new(1, 20, 0);
        assert_eq!(pagination.total_pages, 0);
        assert!(!pagination.has_next);
        assert!(!pagination.has_prev);
    }

    #[test]
    fn pagination_with_total_divisible_by_limit() {
        let pagination = Pagination::new(2, 10, 30);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next);
        assert!(pagination.has_prev);

        let last = Pagination::new(3, 10, 30);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn pagination_on_partial_last_page() {
        let pagination = Pagination::new(3, 10, 21);
        assert_eq!(pagination.total_pages, 3);
        assert!(!pagination.has_next);
        assert!(pagination.has_prev);

        let beyond = Pagination::new(5, 10, 21);
        assert!(!beyond.has_next);
        assert!(beyond.has_prev);
    }

    #[test]
    fn pagination_serializes_in_camel_case() {
        let value = serde_json::to_value(Pagination::new(1, 20, 41)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "page": 1,
                "limit": 20,
                "total": 41,
                "totalPages": 3,
                "hasNext": true,
                "hasPrev": false,
            })
        );
    }

    #[test]
    fn update_request_validates_each_field() {
        let changes = UpdatePlayerRequest {
            hits: Some(200),
            average: Some(0.0),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.hits, Some(200));
        assert_eq!(changes.average, Some(0.0));
        assert_eq!(changes.home_runs, None);

        let negative = UpdatePlayerRequest {
            rbi: Some(-3),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let above_one = UpdatePlayerRequest {
            average: Some(1.2),
            ..Default::default()
        };
        assert!(above_one.validate().is_err());

        let blank_name = UpdatePlayerRequest {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn update_request_uses_camel_case_fields() {
        let request: UpdatePlayerRequest =
            serde_json::from_str(r#"{"homeRuns": 12, "atBats": 400, "unknown": true}"#).unwrap();
        let changes = request.validate().unwrap();
        assert_eq!(changes.home_runs, Some(12));
        assert_eq!(changes.at_bats, Some(400));
    }

    #[test]
    fn apply_merges_only_given_fields() {
        let original = player();
        let mut updated = original.clone();
        let later = original.updated_at + Duration::seconds(5);

        updated.apply(
            PlayerChanges {
                home_runs: Some(41),
                ..Default::default()
            },
            later,
        );

        assert_eq!(updated.home_runs, 41);
        assert_eq!(updated.updated_at, later);
        assert_eq!(
            Player {
                home_runs: original.home_runs,
                updated_at: original.updated_at,
                ..updated
            },
            original
        );
    }

    #[test]
    fn updated_at_strictly_increases() {
        let previous = player().updated_at;
        assert_eq!(
            next_updated_at(previous, previous),
            previous + Duration::milliseconds(1)
        );
        assert_eq!(
            next_updated_at(previous, previous - Duration::seconds(1)),
            previous + Duration::milliseconds(1)
        );
        let later = previous + Duration::seconds(3);
        assert_eq!(next_updated_at(previous, later), later);
    }

    #[test]
    fn placeholder_description_uses_the_stats() {
        assert_eq!(
            player().placeholder_description(),
            "Mike Trout is an exceptional player for the Los Angeles Angels. With 185 hits and 40 home runs, they maintain an impressive 0.305 batting average."
        );
    }

    #[test]
    fn sort_value_of_missing_stat_is_none() {
        let player = player();
        assert_eq!(player.sort_value(SortField::Rbi), None);
        assert_eq!(player.sort_value(SortField::Runs), Some(110.0));
    }

    #[test]
    fn raw_data_is_omitted_when_absent() {
        let value = serde_json::to_value(player()).unwrap();
        assert!(value.get("rawData").is_none());
        assert_eq!(value["homeRuns"], 40);
        assert_eq!(value["rbi"], serde_json::Value::Null);
    }
}
