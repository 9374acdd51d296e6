use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::match_fetch::MatchRecord;

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentOutput {
    pub tournament_id: Option<i64>,
    pub tournament_name: String,
    pub matches: Vec<MatchRecord>,
}

pub fn safe_file_name(country: &str) -> String {
    country.replace('&', "and").replace('/', "_")
}

pub fn country_file_path(dir: &Path, country: &str) -> PathBuf {
    dir.join(format!("{}.json", safe_file_name(country)))
}

/// Write one country's tournaments as an indented UTF-8 JSON array.
/// Replaces any previous file for the same country.
pub fn write_country_file(
    dir: &Path,
    country: &str,
    tournaments: &[TournamentOutput],
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = country_file_path(dir, country);

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    tournaments
        .serialize(&mut ser)
        .context("serialize country tournaments")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &buf).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("swap {}", path.display()))?;
    Ok(path)
}

pub fn read_country_file(path: &Path) -> Result<Vec<TournamentOutput>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid country file {}", path.display()))
}

/// Remove `.json` files in `dir` that are not in `keep`. Returns what was removed.
pub fn prune_stale_files(dir: &Path, keep: &HashSet<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))?;
    for entry in entries {
        let path = entry.context("read dir entry")?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if keep.contains(&path) {
            continue;
        }
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
        removed.push(path);
    }
    removed.sort();
    Ok(removed)
}
