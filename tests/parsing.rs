use std::fs;
use std::path::PathBuf;

use linefeed_scraper::config::{FeedMode, ScraperConfig};
use linefeed_scraper::league_resolver::parse_champs_json;
use linefeed_scraper::match_fetch::{Market, parse_odds_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_championships_fixture() {
    let cfg = ScraperConfig::default();
    let raw = read_fixture("champs.json");
    let index = parse_champs_json(&raw, &cfg.known_countries).expect("fixture should parse");

    assert_eq!(index.len(), 9);
    assert_eq!(index.league_count(), 11);

    let england = index.get("England").expect("england group");
    let names: Vec<&str> = england.leagues.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Premier League", "Championship", "FA Cup"]);
    assert_eq!(index.clean_country("England"), "England");

    assert_eq!(index.clean_country("Qatar Stars League"), "Qatar");
    assert_eq!(
        index.get("Qatar Stars League").unwrap().leagues[0].name,
        "Stars League"
    );
    assert_eq!(
        index.clean_country("Trinidad & Tobago Pro League"),
        "Trinidad & Tobago"
    );
    assert_eq!(index.clean_country("UEFA Europa League"), "UEFA Europa League");
    assert_eq!(index.clean_country("Côte d'Ivoire. Ligue 1"), "Côte d'Ivoire");
    assert_eq!(index.get("Esports. FIFA 24").unwrap().leagues[0].id, None);
}

#[test]
fn every_group_has_a_clean_country() {
    let cfg = ScraperConfig::default();
    let index = parse_champs_json(&read_fixture("champs.json"), &cfg.known_countries)
        .expect("fixture should parse");
    for group in index.groups() {
        assert!(!index.clean_country(&group.raw_label).is_empty());
        if let Some((before, _)) = group.raw_label.split_once(". ") {
            assert_eq!(index.clean_country(&group.raw_label), before);
        }
    }
}

#[test]
fn championship_groups_keep_upstream_order() {
    let index = parse_champs_json(&read_fixture("champs.json"), &[]).expect("fixture should parse");
    let labels: Vec<&str> = index.groups().iter().map(|g| g.raw_label.as_str()).collect();
    assert_eq!(labels[0], "England");
    assert_eq!(labels[1], "Qatar Stars League");
    assert_eq!(labels[8], "Esports. FIFA 24");
    // Without the known list the label has no separator and files under itself.
    assert_eq!(index.clean_country("Qatar Stars League"), "Qatar Stars League");
}

#[test]
fn parses_prematch_odds_fixture() {
    let raw = read_fixture("odds_prematch.json");
    let rows = parse_odds_json(&raw, FeedMode::Prematch, 3600).expect("fixture should parse");
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.match_id, Some(232567001));
    assert_eq!(first.date, "14/11/2023");
    assert_eq!(first.time, "23:13");
    assert_eq!(first.odd(Market::HomeWin), Some(1.85));
    assert_eq!(first.odd(Market::Draw), Some(3.6));
    assert_eq!(first.odd(Market::AwayWin), Some(4.4));
    assert_eq!(first.odd(Market::HomeOrDraw), Some(1.22));
    assert_eq!(first.odd(Market::HomeOrAway), Some(1.3));
    assert_eq!(first.odd(Market::DrawOrAway), Some(1.95));
    // Aggregated line overwrites the direct one; the cancelled under is ignored.
    assert_eq!(first.odd(Market::Over2_5), Some(1.72));
    assert_eq!(first.odd(Market::Under2_5), Some(2.15));
    assert_eq!(first.odd(Market::BothTeamsScore), Some(1.62));
    assert_eq!(first.odd(Market::NotBothTeamsScore), Some(2.25));
    assert_eq!(first.odds.len(), 10);

    let second = &rows[1];
    assert_eq!(second.home_team.as_deref(), Some("Olympique Béja"));
    assert_eq!(second.date, "02/01/2024");
    assert_eq!(second.time, "00:30");
    assert_eq!(second.odd(Market::HomeWin), Some(5.1));
    assert_eq!(second.odds.len(), 1);
}

#[test]
fn parses_live_odds_fixture() {
    let raw = read_fixture("odds_live.json");
    let rows = parse_odds_json(&raw, FeedMode::Live, 3600).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].match_id, Some(600123));
    assert_eq!(rows[0].odd(Market::AwayWin), Some(2.9));
    // An empty TG string is not a tag.
    assert_eq!(rows[1].match_id, Some(600125));
    assert!(rows[1].odds.is_empty());
}

#[test]
fn same_payload_in_prematch_mode_uses_constant_ids() {
    let raw = read_fixture("odds_live.json");
    let rows = parse_odds_json(&raw, FeedMode::Prematch, 3600).expect("fixture should parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].match_id, Some(232567001));
    assert_eq!(rows[1].match_id, None);
}
