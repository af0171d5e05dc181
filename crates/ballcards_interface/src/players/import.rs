// Conversion of the raw records of the external baseball data set into players.
//
// The data set is not consistent in its field names: each stat is looked up
// through a list of aliases and the first alias holding a usable value wins.
// A value of zero or a value that can't be parsed counts as missing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::{AppError, Result};
use crate::players::model::{batting_average, required_text, stat_count, NewPlayer};

const NAME_ALIASES: &[&str] = &["Player name", "name"];
const HITS_ALIASES: &[&str] = &["Hits", "hits"];
const HOME_RUNS_ALIASES: &[&str] = &["home run", "HR"];
const AVERAGE_ALIASES: &[&str] = &["AVG", "avg"];
const AT_BATS_ALIASES: &[&str] = &["At-bat", "AB"];
const RUNS_ALIASES: &[&str] = &["Runs", "R"];
const RBI_ALIASES: &[&str] = &["run batted in", "RBI"];

pub const UNKNOWN_TEAM: &str = "Unknown";

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?\d+").expect("valid integer pattern"));
static LEADING_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid decimal pattern")
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Key identifying a player across imports: `<name>-<position>` with every
/// run of whitespace replaced by a dash.
pub fn external_id(name: &str, position: Option<&str>) -> String {
    let key = match position {
        Some(position) => format!("{}-{}", name, position),
        None => name.to_string(),
    };
    WHITESPACE.replace_all(&key, "-").into_owned()
}

/// Best effort name of a raw record, used when reporting a failure.
pub fn record_name(record: &Value) -> Option<String> {
    first_text(record, NAME_ALIASES)
}

/// Convert a raw record into a validated player. The record itself is kept
/// as the player raw data.
pub fn parse_record(record: &Value) -> Result<NewPlayer> {
    if !record.is_object() {
        return Err(AppError::validation("player record must be a json object"));
    }

    let name = first_text(record, NAME_ALIASES)
        .ok_or_else(|| AppError::validation("player record has no name"))?;
    let name = required_text("name", name)?;
    let team = first_text(record, &["team"]).unwrap_or_else(|| UNKNOWN_TEAM.to_string());
    let team = required_text("team", team)?;
    let position = first_text(record, &["position"]);

    let hits = first_integer(record, HITS_ALIASES).unwrap_or(0);
    let home_runs = first_integer(record, HOME_RUNS_ALIASES).unwrap_or(0);
    let average = first_decimal(record, AVERAGE_ALIASES).unwrap_or(0.0);
    let at_bats = first_integer(record, AT_BATS_ALIASES);
    let runs = first_integer(record, RUNS_ALIASES);
    let rbi = first_integer(record, RBI_ALIASES);

    Ok(NewPlayer {
        external_id: external_id(&name, position.as_deref()),
        name,
        team,
        position,
        hits: stat_count("hits", hits)?,
        home_runs: stat_count("homeRuns", home_runs)?,
        average: batting_average(average)?,
        at_bats: at_bats.map(|v| stat_count("atBats", v)).transpose()?,
        runs: runs.map(|v| stat_count("runs", v)).transpose()?,
        rbi: rbi.map(|v| stat_count("rbi", v)).transpose()?,
        raw_data: Some(record.clone()),
    })
}

fn first_text(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match record.get(alias)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn first_integer(record: &Value, aliases: &[&str]) -> Option<i64> {
    aliases
        .iter()
        .find_map(|alias| record.get(alias).and_then(parse_integer))
}

fn first_decimal(record: &Value, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .find_map(|alias| record.get(alias).and_then(parse_decimal))
}

// Leading integer of the value, numbers are truncated. Zero is missing.
fn parse_integer(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(text) => LEADING_INTEGER
            .find(text)
            .and_then(|m| m.as_str().trim().parse().ok()),
        _ => None,
    };
    parsed.filter(|v| *v != 0)
}

// Leading decimal of the value (".305" is 0.305). Zero is missing.
fn parse_decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => LEADING_DECIMAL
            .find(text)
            .and_then(|m| m.as_str().trim().parse().ok()),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && *v != 0.0)
}
