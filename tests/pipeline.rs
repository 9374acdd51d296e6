use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;

use linefeed_scraper::config::ScraperConfig;
use linefeed_scraper::league_resolver::parse_champs_json;
use linefeed_scraper::match_fetch::{Market, MatchRecord};
use linefeed_scraper::persist::{
    TournamentOutput, prune_stale_files, read_country_file, write_country_file,
};
use linefeed_scraper::pipeline::{collect_countries, prepare_index};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("linefeed-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn test_config(dir: &Path) -> ScraperConfig {
    let mut cfg = ScraperConfig::default();
    cfg.output_dir = dir.to_path_buf();
    cfg.delay = Duration::ZERO;
    cfg
}

fn champs_fixture() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/champs.json");
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn sample_match(id: i64, home: &str, away: &str) -> MatchRecord {
    let mut odds = BTreeMap::new();
    odds.insert(Market::HomeWin, Some(1.85));
    odds.insert(Market::Draw, Some(3.4));
    odds.insert(Market::BothTeamsScore, None);
    MatchRecord {
        match_id: Some(id),
        date: "14/11/2023".to_string(),
        time: "23:13".to_string(),
        home_team: Some(home.to_string()),
        away_team: Some(away.to_string()),
        odds,
    }
}

#[test]
fn writes_one_file_per_country_with_data() {
    let dir = scratch_dir("per-country");
    let cfg = test_config(&dir);
    let index = parse_champs_json(&champs_fixture(), &cfg.known_countries).unwrap();

    let mut calls = Vec::new();
    let summary = collect_countries(&index, &cfg, |id| {
        calls.push(id);
        match id {
            88637 => Ok(vec![sample_match(1, "Arsenal", "Chelsea")]),
            108319 => Ok(Vec::new()),
            2287 => Ok(vec![sample_match(2, "Club Africain", "CS Sfaxien")]),
            1450 => Ok(vec![sample_match(3, "Defence Force", "W Connection")]),
            51015 => Ok(vec![sample_match(4, "Al-Shorta", "Al-Zawraa")]),
            51016 => Ok(vec![sample_match(5, "Erbil", "Duhok")]),
            _ => Err(anyhow!("http 529 Site Overloaded")),
        }
    });

    // Leagues without an id never reach the fetcher.
    assert_eq!(
        calls,
        [88637, 105759, 108319, 5, 2287, 1450, 118593, 51015, 51016, 34101]
    );
    assert_eq!(summary.countries_total, 9);
    assert_eq!(summary.leagues_fetched, 6);
    assert_eq!(summary.leagues_failed, 5);
    assert_eq!(summary.matches_total, 5);
    assert_eq!(summary.errors.len(), 5);

    let mut names: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        ["England.json", "Iraq.json", "Trinidad and Tobago.json", "Tunisia.json"]
    );
    assert_eq!(summary.files.len(), 4);
    assert_eq!(summary.countries_written, 4);

    let england = read_country_file(&dir.join("England.json")).unwrap();
    assert_eq!(england.len(), 2);
    assert_eq!(england[0].tournament_id, Some(88637));
    assert_eq!(england[0].tournament_name, "Premier League");
    assert_eq!(england[0].matches[0].home_team.as_deref(), Some("Arsenal"));
    assert_eq!(england[1].tournament_name, "FA Cup");
    assert!(england[1].matches.is_empty());

    // Both Iraq entries are separate groups; the later one owns the file.
    let iraq = read_country_file(&dir.join("Iraq.json")).unwrap();
    assert_eq!(iraq.len(), 1);
    assert_eq!(iraq[0].tournament_name, "Cup");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn country_with_only_failures_gets_no_file() {
    let dir = scratch_dir("all-failed");
    let cfg = test_config(&dir);
    let raw = r#"{"Value":[{"L":"Spain","SC":[
        {"L":"Spain. LaLiga","LI":1},
        {"L":"Spain. Segunda","LI":2}
    ]}]}"#;
    let index = parse_champs_json(raw, &[]).unwrap();

    let summary = collect_countries(&index, &cfg, |_| Err(anyhow!("invalid odds json")));
    assert_eq!(summary.countries_written, 0);
    assert_eq!(summary.leagues_failed, 2);
    assert!(!dir.join("Spain.json").exists());
}

#[test]
fn country_file_round_trips_unicode_and_odds() {
    let dir = scratch_dir("round-trip");
    let tournaments = vec![TournamentOutput {
        tournament_id: Some(34101),
        tournament_name: "Ligue 1".to_string(),
        matches: vec![sample_match(9, "Séwé Sport", "Stade d'Abidjan")],
    }];

    let path = write_country_file(&dir, "Côte d'Ivoire", &tournaments).unwrap();
    assert_eq!(path, dir.join("Côte d'Ivoire.json"));

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("Séwé Sport"));
    assert!(raw.contains("\n    {"));
    assert!(raw.contains("\"1_odd\": 1.85"));
    assert!(raw.contains("\"both_score_odd\": null"));

    let back = read_country_file(&path).unwrap();
    assert_eq!(back, tournaments);
    assert!(!dir.join("Côte d'Ivoire.json.tmp").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn prepare_index_drops_blacklisted_and_reverses() {
    let dir = scratch_dir("prepare");
    let mut cfg = test_config(&dir);
    cfg.skipped_tournaments = vec!["FA Cup".to_string(), "Stars League".to_string()];
    cfg.reverse = true;

    let mut index = parse_champs_json(&champs_fixture(), &cfg.known_countries).unwrap();
    let dropped = prepare_index(&mut index, &cfg);

    // "Stars League" matches both Qatar and the Iraq entry.
    assert_eq!(dropped, 3);
    assert_eq!(index.len(), 7);
    assert_eq!(index.groups()[0].raw_label, "Esports. FIFA 24");
    assert_eq!(index.groups().last().unwrap().raw_label, "England");
    assert_eq!(index.get("England").unwrap().leagues.len(), 2);
}

#[test]
fn prune_removes_only_unlisted_json() {
    let dir = scratch_dir("prune");
    fs::create_dir_all(&dir).unwrap();
    for name in ["Spain.json", "Old Country.json", "notes.txt"] {
        fs::write(dir.join(name), "[]").unwrap();
    }
    let keep: HashSet<PathBuf> = [dir.join("Spain.json")].into_iter().collect();

    let removed = prune_stale_files(&dir, &keep).unwrap();
    assert_eq!(removed, vec![dir.join("Old Country.json")]);
    assert!(dir.join("Spain.json").exists());
    assert!(dir.join("notes.txt").exists());

    let _ = fs::remove_dir_all(&dir);
}
