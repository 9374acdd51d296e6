use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

const DEFAULT_SPORT_ID: u32 = 1;
const DEFAULT_DELAY_MS: u64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UTC_OFFSET_SECS: i32 = 3600;

const PREMATCH_CHAMPS_URL: &str = "https://tn.1xbet.com/service-api/LineFeed/GetChampsZip";
const PREMATCH_ODDS_URL: &str = "https://1xbet.com/service-api/LineFeed/Get1x2_VZip";
const LIVE_CHAMPS_URL: &str = "https://1xbet.com/LiveFeed/GetChampsZip";
const LIVE_ODDS_URL: &str = "https://1xbet.com/LiveFeed/Get1x2_VZip";

const DEFAULT_SKIPPED_TOURNAMENTS: &[&str] = &["Team vs Player"];

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

// Labels of single-league entries that start with the country but lack
// the usual "Country. League" separator. Trailing spaces are significant.
const DEFAULT_KNOWN_COUNTRIES: &[&str] = &[
    "Trinidad & Tobago",
    "Trinidad and Tobago",
    "Qatar",
    "Oman",
    "Nicaragua",
    "Northern Ireland",
    "Kyrgyzstan",
    "Kyrgyzstan ",
    "Iraq",
    "Dominican Republic",
    "Cuba",
    "Botswana",
    "Japan",
    "Tunisia",
    "China",
    "Israel",
    "Jamaica",
    "Jordan",
    "Rwanda",
    "Uganda ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Prematch,
    Live,
}

impl FeedMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prematch" | "line" => Some(FeedMode::Prematch),
            "live" => Some(FeedMode::Live),
            _ => None,
        }
    }

    fn champs_url(self) -> &'static str {
        match self {
            FeedMode::Prematch => PREMATCH_CHAMPS_URL,
            FeedMode::Live => LIVE_CHAMPS_URL,
        }
    }

    fn odds_url(self) -> &'static str {
        match self {
            FeedMode::Prematch => PREMATCH_ODDS_URL,
            FeedMode::Live => LIVE_ODDS_URL,
        }
    }

    fn referer_segment(self) -> &'static str {
        match self {
            FeedMode::Prematch => "line",
            FeedMode::Live => "live",
        }
    }

    fn default_output_dir(self) -> &'static str {
        match self {
            FeedMode::Prematch => "scraped_matches",
            FeedMode::Live => "scraped_live_matches",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub mode: FeedMode,
    pub sport_id: u32,
    pub champs_url: String,
    pub odds_url: String,
    pub output_dir: PathBuf,
    pub delay: Duration,
    pub request_timeout: Duration,
    pub utc_offset_secs: i32,
    pub known_countries: Vec<String>,
    pub skipped_tournaments: Vec<String>,
    pub reverse: bool,
    pub prune_stale: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::for_mode(FeedMode::Prematch)
    }
}

impl ScraperConfig {
    pub fn for_mode(mode: FeedMode) -> Self {
        Self {
            mode,
            sport_id: DEFAULT_SPORT_ID,
            champs_url: mode.champs_url().to_string(),
            odds_url: mode.odds_url().to_string(),
            output_dir: PathBuf::from(mode.default_output_dir()),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
            known_countries: DEFAULT_KNOWN_COUNTRIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            skipped_tournaments: DEFAULT_SKIPPED_TOURNAMENTS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            reverse: false,
            prune_stale: false,
        }
    }

    pub fn from_env() -> Self {
        let mode = env::var("SCRAPER_MODE")
            .ok()
            .and_then(|v| FeedMode::parse(&v))
            .unwrap_or(FeedMode::Prematch);
        let mut cfg = Self::for_mode(mode);

        cfg.sport_id = env::var("SCRAPER_SPORT_ID")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|id| *id != 0)
            .unwrap_or(DEFAULT_SPORT_ID);
        if let Some(url) = env_string("SCRAPER_CHAMPS_URL") {
            cfg.champs_url = url;
        }
        if let Some(url) = env_string("SCRAPER_ODDS_URL") {
            cfg.odds_url = url;
        }
        if let Some(dir) = env_path("SCRAPER_OUTPUT_DIR") {
            cfg.output_dir = dir;
        }
        let delay_ms = env::var("SCRAPER_DELAY_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_DELAY_MS)
            .min(60_000);
        cfg.delay = Duration::from_millis(delay_ms);
        let timeout_secs = env::var("SCRAPER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        cfg.request_timeout = Duration::from_secs(timeout_secs);

        if let Some(path) = env_path("SCRAPER_KNOWN_COUNTRIES_FILE") {
            match load_string_list(&path) {
                Ok(list) => {
                    info!(path = %path.display(), count = list.len(), "loaded known countries");
                    cfg.known_countries = list;
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        "known countries not loaded, using built-in list: {err:#}"
                    );
                }
            }
        }
        if let Some(path) = env_path("SCRAPER_SKIPPED_TOURNAMENTS_FILE") {
            match load_string_list(&path) {
                Ok(list) => {
                    info!(path = %path.display(), count = list.len(), "loaded skipped tournaments");
                    cfg.skipped_tournaments = list;
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        "skipped tournaments not loaded, using built-in list: {err:#}"
                    );
                }
            }
        }

        cfg.reverse = env_bool("SCRAPER_REVERSE", false);
        cfg.prune_stale = env_bool("SCRAPER_PRUNE_STALE", false);
        cfg
    }

    pub fn champs_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sport", self.sport_id.to_string()),
            ("lng", "en".to_string()),
            ("country", "187".to_string()),
            ("partner", "213".to_string()),
            ("virtualSports", "true".to_string()),
            ("groupChamps", "true".to_string()),
        ]
    }

    pub fn odds_query(&self, champs_id: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sports", self.sport_id.to_string()),
            ("champs", champs_id.to_string()),
            ("count", "50".to_string()),
            ("lng", "en".to_string()),
        ];
        if self.mode == FeedMode::Prematch {
            params.push(("tf", "2200000".to_string()));
            params.push(("tz", "1".to_string()));
        }
        params.extend([
            ("mode", "4".to_string()),
            ("country", "187".to_string()),
            ("getEmpty", "true".to_string()),
            ("gr", "70".to_string()),
        ]);
        params
    }

    /// Minimal header set the odds endpoint accepts; overrides the session defaults.
    pub fn odds_headers(&self, champs_id: i64) -> Vec<(&'static str, String)> {
        vec![
            ("Accept", "*/*".to_string()),
            ("User-Agent", USER_AGENT.to_string()),
            ("X-Requested-With", "XMLHttpRequest".to_string()),
            ("Referer", self.referer(champs_id)),
        ]
    }

    pub fn referer(&self, champs_id: i64) -> String {
        format!(
            "https://1xbet.com/en/{}/football/{champs_id}",
            self.mode.referer_segment()
        )
    }

    pub fn is_skipped(&self, tournament_name: &str) -> bool {
        self.skipped_tournaments.iter().any(|t| t == tournament_name)
    }
}

pub fn base_headers() -> [(&'static str, &'static str); 5] {
    [
        ("Accept", "application/json, text/plain, */*"),
        ("User-Agent", USER_AGENT),
        ("X-Requested-With", "XMLHttpRequest"),
        ("X-Svc-Source", "__BETTING_APP__"),
        ("X-App-N", "__BETTING_APP__"),
    ]
}

pub fn load_string_list(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str::<Vec<String>>(&raw).with_context(|| format!("parse {}", path.display()))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_string(key).map(PathBuf::from)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
