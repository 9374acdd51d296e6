use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::http_client::http_client;
use crate::league_resolver::{LeagueIndex, fetch_country_leagues};
use crate::match_fetch::{MatchRecord, fetch_league_matches};
use crate::persist::{TournamentOutput, prune_stale_files, write_country_file};

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub countries_total: usize,
    pub countries_written: usize,
    pub leagues_fetched: usize,
    pub leagues_failed: usize,
    pub leagues_skipped: usize,
    pub matches_total: usize,
    pub files: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Full run: resolve leagues (fatal on failure), fetch every league, write one
/// file per country that produced at least one tournament.
pub fn run(cfg: &ScraperConfig) -> Result<RunSummary> {
    let client = http_client(cfg)?;
    let mut index =
        fetch_country_leagues(&client, cfg).context("unable to resolve country leagues")?;
    info!(
        groups = index.len(),
        leagues = index.league_count(),
        mode = ?cfg.mode,
        "resolved championships"
    );

    let skipped = prepare_index(&mut index, cfg);
    let mut summary = collect_countries(&index, cfg, |champs_id| {
        fetch_league_matches(&client, cfg, champs_id)
    });
    summary.leagues_skipped = skipped;

    if cfg.prune_stale {
        let keep: HashSet<PathBuf> = summary.files.iter().cloned().collect();
        match prune_stale_files(&cfg.output_dir, &keep) {
            Ok(removed) => {
                for path in &removed {
                    info!(path = %path.display(), "deleted stale file");
                }
                summary.pruned = removed;
            }
            Err(err) => {
                warn!("stale file cleanup failed: {err:#}");
                summary.errors.push(format!("cleanup: {err:#}"));
            }
        }
    }
    Ok(summary)
}

/// Apply the tournament blacklist and ordering flag. Returns how many
/// leagues were dropped.
pub fn prepare_index(index: &mut LeagueIndex, cfg: &ScraperConfig) -> usize {
    let mut dropped = 0;
    if !cfg.skipped_tournaments.is_empty() {
        let removed = index.retain_leagues(|league| !cfg.is_skipped(&league.name));
        for (country, league) in &removed {
            info!(
                country = %country,
                tournament = %league.name,
                "skipping blacklisted tournament"
            );
        }
        dropped = removed.len();
    }
    if cfg.reverse {
        index.reverse();
    }
    dropped
}

/// Walk countries -> leagues -> matches with `fetch` standing in for the
/// per-league odds request. League failures are logged and skipped.
pub fn collect_countries<F>(index: &LeagueIndex, cfg: &ScraperConfig, mut fetch: F) -> RunSummary
where
    F: FnMut(i64) -> Result<Vec<MatchRecord>>,
{
    let mut summary = RunSummary {
        countries_total: index.len(),
        ..RunSummary::default()
    };

    for group in index.groups() {
        let clean = index.clean_country(&group.raw_label);
        info!(country = %clean, raw = %group.raw_label, "processing country");

        let mut output = Vec::new();
        for league in &group.leagues {
            let Some(champs_id) = league.id else {
                warn!(country = %clean, league = %league.name, "league has no id, skipped");
                summary.leagues_failed += 1;
                summary
                    .errors
                    .push(format!("{clean} - {}: league has no id", league.name));
                continue;
            };

            info!(league = %league.name, id = champs_id, "fetching");
            let result = fetch(champs_id);
            if !cfg.delay.is_zero() {
                thread::sleep(cfg.delay);
            }
            match result {
                Ok(matches) => {
                    info!(league = %league.name, matches = matches.len(), "fetched");
                    summary.leagues_fetched += 1;
                    summary.matches_total += matches.len();
                    output.push(TournamentOutput {
                        tournament_id: league.id,
                        tournament_name: league.name.clone(),
                        matches,
                    });
                }
                Err(err) => {
                    warn!(league = %league.name, id = champs_id, "skipped: {err:#}");
                    summary.leagues_failed += 1;
                    summary
                        .errors
                        .push(format!("{clean} - {} ({champs_id}): {err:#}", league.name));
                }
            }
        }

        if output.is_empty() {
            info!(country = %clean, "no data, skipping");
            continue;
        }

        match write_country_file(&cfg.output_dir, clean, &output) {
            Ok(path) => {
                info!(path = %path.display(), tournaments = output.len(), "saved");
                // A later group with the same country replaces the file; count it once.
                if !summary.files.contains(&path) {
                    summary.files.push(path);
                    summary.countries_written += 1;
                }
            }
            Err(err) => {
                warn!(country = %clean, "write failed: {err:#}");
                summary.errors.push(format!("{clean}: {err:#}"));
            }
        }
    }

    summary
}
