use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScraperConfig;
use crate::http_client::get_json_body;
use crate::wire::{int_or_none, list_or_empty, string_or_none};

const UNKNOWN_LABEL: &str = "Unknown";
const COUNTRY_SEPARATOR: &str = ". ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRecord {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryGroup {
    pub raw_label: String,
    pub leagues: Vec<LeagueRecord>,
}

/// Raw championship labels grouped in upstream order, plus the clean
/// country name each raw label resolved to.
///
/// Single-league entries are keyed by their own raw label, so two of them
/// resolving to the same country stay in separate groups and share a file
/// name. The driver writes whichever group comes last for that name.
#[derive(Debug, Clone, Default)]
pub struct LeagueIndex {
    groups: Vec<CountryGroup>,
    positions: HashMap<String, usize>,
    country_names: HashMap<String, String>,
}

impl LeagueIndex {
    pub fn push_league(&mut self, raw_label: &str, league: LeagueRecord) {
        self.group_mut(raw_label).leagues.push(league);
    }

    pub fn set_country(&mut self, raw_label: &str, clean: &str) {
        self.group_mut(raw_label);
        self.country_names
            .insert(raw_label.to_string(), clean.to_string());
    }

    /// Clean country for a raw label; the label itself when unmapped.
    pub fn clean_country<'a>(&'a self, raw_label: &'a str) -> &'a str {
        self.country_names
            .get(raw_label)
            .map(|s| s.as_str())
            .unwrap_or(raw_label)
    }

    pub fn groups(&self) -> &[CountryGroup] {
        &self.groups
    }

    pub fn get(&self, raw_label: &str) -> Option<&CountryGroup> {
        self.positions.get(raw_label).map(|&idx| &self.groups[idx])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn league_count(&self) -> usize {
        self.groups.iter().map(|g| g.leagues.len()).sum()
    }

    pub fn reverse(&mut self) {
        self.groups.reverse();
        self.reindex();
    }

    /// Keep leagues matching `keep`; groups left empty are dropped.
    /// Returns the leagues that were removed, labelled with their clean country.
    pub fn retain_leagues<F>(&mut self, mut keep: F) -> Vec<(String, LeagueRecord)>
    where
        F: FnMut(&LeagueRecord) -> bool,
    {
        let mut removed = Vec::new();
        for group in &mut self.groups {
            let clean = self
                .country_names
                .get(&group.raw_label)
                .cloned()
                .unwrap_or_else(|| group.raw_label.clone());
            let mut kept = Vec::with_capacity(group.leagues.len());
            for league in group.leagues.drain(..) {
                if keep(&league) {
                    kept.push(league);
                } else {
                    removed.push((clean.clone(), league));
                }
            }
            group.leagues = kept;
        }
        let before = self.groups.len();
        self.groups.retain(|g| !g.leagues.is_empty());
        if self.groups.len() != before {
            self.reindex();
        }
        removed
    }

    fn group_mut(&mut self, raw_label: &str) -> &mut CountryGroup {
        let idx = match self.positions.get(raw_label) {
            Some(&idx) => idx,
            None => {
                self.groups.push(CountryGroup {
                    raw_label: raw_label.to_string(),
                    leagues: Vec::new(),
                });
                let idx = self.groups.len() - 1;
                self.positions.insert(raw_label.to_string(), idx);
                idx
            }
        };
        &mut self.groups[idx]
    }

    fn reindex(&mut self) {
        self.positions = self
            .groups
            .iter()
            .enumerate()
            .map(|(idx, g)| (g.raw_label.clone(), idx))
            .collect();
    }
}

#[derive(Debug, Deserialize)]
struct ChampsResponse {
    #[serde(rename = "Value", default, deserialize_with = "list_or_empty")]
    value: Vec<ChampItem>,
}

#[derive(Debug, Deserialize)]
struct ChampItem {
    #[serde(rename = "L", default, deserialize_with = "string_or_none")]
    label: Option<String>,
    #[serde(rename = "LI", default, deserialize_with = "int_or_none")]
    league_id: Option<i64>,
    #[serde(rename = "SC", default, deserialize_with = "list_or_empty")]
    sub_leagues: Vec<SubLeague>,
}

#[derive(Debug, Deserialize)]
struct SubLeague {
    #[serde(rename = "L", default, deserialize_with = "string_or_none")]
    label: Option<String>,
    #[serde(rename = "LI", default, deserialize_with = "int_or_none")]
    league_id: Option<i64>,
}

pub fn fetch_country_leagues(client: &Client, cfg: &ScraperConfig) -> Result<LeagueIndex> {
    let body = get_json_body(client, &cfg.champs_url, &cfg.champs_query(), &[])
        .context("championships request failed")?;
    parse_champs_json(&body, &cfg.known_countries)
}

pub fn parse_champs_json(raw: &str, known_countries: &[String]) -> Result<LeagueIndex> {
    let trimmed = raw.trim();
    if trimmed == "null" {
        return Ok(LeagueIndex::default());
    }
    let resp: ChampsResponse =
        serde_json::from_str(trimmed).context("invalid championships json")?;

    let mut index = LeagueIndex::default();
    for item in resp.value {
        let raw_label = item.label.as_deref().unwrap_or(UNKNOWN_LABEL);
        if !item.sub_leagues.is_empty() {
            index.set_country(raw_label, raw_label);
            for sub in &item.sub_leagues {
                let name = sub.label.as_deref().map(strip_league_prefix).unwrap_or("");
                index.push_league(
                    raw_label,
                    LeagueRecord {
                        id: sub.league_id,
                        name: name.to_string(),
                    },
                );
            }
            continue;
        }

        let country = resolve_country(raw_label, known_countries);
        let name = single_league_name(raw_label, &country);
        debug!(
            raw = raw_label,
            country = %country,
            league = name,
            "resolved single-league entry"
        );
        index.set_country(raw_label, &country);
        index.push_league(
            raw_label,
            LeagueRecord {
                id: item.league_id,
                name: name.to_string(),
            },
        );
    }
    Ok(index)
}

type CountryRule = fn(&str, &[String]) -> Option<String>;

// First rule that yields a country wins.
const COUNTRY_RULES: &[CountryRule] = &[
    country_before_separator,
    country_from_known_prefix,
    country_from_whole_label,
];

pub fn resolve_country(label: &str, known_countries: &[String]) -> String {
    COUNTRY_RULES
        .iter()
        .find_map(|rule| rule(label, known_countries))
        .unwrap_or_else(|| label.to_string())
}

/// "Country. League" -> "Country". Accepted unconditionally when non-empty.
pub fn country_before_separator(label: &str, _known: &[String]) -> Option<String> {
    label
        .split_once(COUNTRY_SEPARATOR)
        .map(|(country, _)| country)
        .filter(|country| !country.is_empty())
        .map(|country| country.to_string())
}

pub fn country_from_known_prefix(label: &str, known: &[String]) -> Option<String> {
    known
        .iter()
        .find(|country| !country.is_empty() && label.starts_with(country.as_str()))
        .cloned()
}

/// Last resort: the league is filed under its own full label.
pub fn country_from_whole_label(label: &str, _known: &[String]) -> Option<String> {
    Some(label.to_string())
}

pub fn single_league_name<'a>(label: &'a str, country: &str) -> &'a str {
    if let Some(rest) = label.strip_prefix(country) {
        let mut remainder = rest.trim();
        if let Some(after_dot) = remainder.strip_prefix('.') {
            remainder = after_dot.trim();
        }
        if remainder.is_empty() { label } else { remainder }
    } else {
        strip_league_prefix(label)
    }
}

pub fn strip_league_prefix(label: &str) -> &str {
    label
        .split_once(COUNTRY_SEPARATOR)
        .map(|(_, rest)| rest)
        .unwrap_or(label)
}
