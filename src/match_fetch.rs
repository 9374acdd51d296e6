use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{FeedMode, ScraperConfig};
use crate::http_client::get_json_body;
use crate::wire::{float_or_none, int_or_none, list_or_empty, string_or_none, timestamp_or_none};

const OVER_UNDER_LINE: f64 = 2.5;
const BOTH_TEAMS_SCORE_GROUP: i64 = 19;

/// Odds fields a match record can carry. Serialized names are the output keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "1_odd")]
    HomeWin,
    #[serde(rename = "draw_odd")]
    Draw,
    #[serde(rename = "2_odd")]
    AwayWin,
    #[serde(rename = "1X_odd")]
    HomeOrDraw,
    #[serde(rename = "12_odd")]
    HomeOrAway,
    #[serde(rename = "2X_odd")]
    DrawOrAway,
    #[serde(rename = "over_2.5_odd")]
    Over2_5,
    #[serde(rename = "under_2.5_odd")]
    Under2_5,
    #[serde(rename = "both_score_odd")]
    BothTeamsScore,
    #[serde(rename = "both_noscore_odd")]
    NotBothTeamsScore,
}

impl Market {
    /// Map an event's market type, line and group to an output field.
    pub fn classify(
        market_type: Option<i64>,
        point: Option<f64>,
        group: Option<i64>,
    ) -> Option<Self> {
        let t = market_type?;
        let market = match t {
            1 => Market::HomeWin,
            2 => Market::Draw,
            3 => Market::AwayWin,
            4 => Market::HomeOrDraw,
            5 => Market::HomeOrAway,
            6 => Market::DrawOrAway,
            9 if point == Some(OVER_UNDER_LINE) => Market::Over2_5,
            10 if point == Some(OVER_UNDER_LINE) => Market::Under2_5,
            180 if group == Some(BOTH_TEAMS_SCORE_GROUP) => Market::BothTeamsScore,
            181 if group == Some(BOTH_TEAMS_SCORE_GROUP) => Market::NotBothTeamsScore,
            _ => return None,
        };
        Some(market)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: Option<i64>,
    pub date: String,
    pub time: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    #[serde(flatten)]
    pub odds: BTreeMap<Market, Option<f64>>,
}

impl MatchRecord {
    pub fn odd(&self, market: Market) -> Option<f64> {
        self.odds.get(&market).copied().flatten()
    }
}

#[derive(Debug, Deserialize)]
struct OddsResponse {
    #[serde(rename = "Value", default, deserialize_with = "list_or_empty")]
    value: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(rename = "CI", default, deserialize_with = "int_or_none")]
    const_id: Option<i64>,
    #[serde(rename = "I", default, deserialize_with = "int_or_none")]
    live_id: Option<i64>,
    #[serde(rename = "S", default, deserialize_with = "timestamp_or_none")]
    start: Option<i64>,
    #[serde(rename = "O1", default, deserialize_with = "string_or_none")]
    home: Option<String>,
    #[serde(rename = "O2", default, deserialize_with = "string_or_none")]
    away: Option<String>,
    #[serde(rename = "TG", default)]
    tag: Option<Value>,
    #[serde(rename = "E", default, deserialize_with = "list_or_empty")]
    events: Vec<RawEvent>,
    #[serde(rename = "AE", default, deserialize_with = "list_or_empty")]
    aggregated: Vec<RawAggregate>,
}

#[derive(Debug, Deserialize)]
struct RawAggregate {
    #[serde(rename = "ME", default, deserialize_with = "list_or_empty")]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "T", default, deserialize_with = "int_or_none")]
    market_type: Option<i64>,
    #[serde(rename = "P", default, deserialize_with = "float_or_none")]
    point: Option<f64>,
    #[serde(rename = "C", default, deserialize_with = "float_or_none")]
    price: Option<f64>,
    #[serde(rename = "CE", default)]
    cancelled: Option<Value>,
    #[serde(rename = "G", default, deserialize_with = "int_or_none")]
    group: Option<i64>,
}

pub fn fetch_league_matches(
    client: &Client,
    cfg: &ScraperConfig,
    champs_id: i64,
) -> Result<Vec<MatchRecord>> {
    let body = get_json_body(
        client,
        &cfg.odds_url,
        &cfg.odds_query(champs_id),
        &cfg.odds_headers(champs_id),
    )
    .with_context(|| format!("odds request failed for league {champs_id}"))?;
    parse_odds_json(&body, cfg.mode, cfg.utc_offset_secs)
}

pub fn parse_odds_json(
    raw: &str,
    mode: FeedMode,
    utc_offset_secs: i32,
) -> Result<Vec<MatchRecord>> {
    let trimmed = raw.trim();
    if trimmed == "null" {
        return Ok(Vec::new());
    }
    let resp: OddsResponse = serde_json::from_str(trimmed).context("invalid odds json")?;
    let offset = FixedOffset::east_opt(utc_offset_secs)
        .with_context(|| format!("utc offset out of range: {utc_offset_secs}s"))?;

    let mut out = Vec::new();
    for m in resp.value {
        if let Some(record) = build_match_record(m, mode, offset) {
            out.push(record);
        }
    }
    Ok(out)
}

fn build_match_record(m: RawMatch, mode: FeedMode, offset: FixedOffset) -> Option<MatchRecord> {
    let match_id = match mode {
        FeedMode::Prematch => m.const_id,
        FeedMode::Live => {
            // Live rows tagged TG are specials/statistics, not fixtures.
            if m.tag.as_ref().is_some_and(is_truthy) {
                return None;
            }
            let id = m.live_id?;
            Some(id)
        }
    };
    let (date, time) = kickoff_local(m.start?, offset)?;

    let flattened = m.aggregated.into_iter().flat_map(|ae| ae.events);
    let odds = extract_odds(m.events.into_iter().chain(flattened));

    Some(MatchRecord {
        match_id,
        date,
        time,
        home_team: m.home,
        away_team: m.away,
        odds,
    })
}

// Later events overwrite earlier ones for the same market.
fn extract_odds(events: impl Iterator<Item = RawEvent>) -> BTreeMap<Market, Option<f64>> {
    let mut odds = BTreeMap::new();
    for ev in events {
        if ev.cancelled.is_some() {
            continue;
        }
        if let Some(market) = Market::classify(ev.market_type, ev.point, ev.group) {
            odds.insert(market, ev.price);
        }
    }
    odds
}

/// Epoch seconds (UTC) to `DD/MM/YYYY` and `HH:MM` at the given offset.
pub fn kickoff_local(epoch_secs: i64, offset: FixedOffset) -> Option<(String, String)> {
    let local = DateTime::from_timestamp(epoch_secs, 0)?.with_timezone(&offset);
    Some((
        local.format("%d/%m/%Y").to_string(),
        local.format("%H:%M").to_string(),
    ))
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
