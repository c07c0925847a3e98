//! Leaderboard persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Longest name stored on the board.
pub const MAX_NAME_LEN: usize = 32;

/// One finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Submissions it took to win; lower is better.
    pub score: u32,
    /// Player name.
    pub name: String,
}

/// CSV-backed leaderboard kept sorted by ascending score.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    path: PathBuf,
}

impl Leaderboard {
    /// Create a leaderboard stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing this leaderboard.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, best first. A missing file is an empty leaderboard.
    pub fn entries(&self) -> Result<Vec<LeaderboardEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut entries = Vec::new();
        for row in reader.deserialize::<LeaderboardEntry>() {
            let entry =
                row.with_context(|| format!("failed to parse {}", self.path.display()))?;
            entries.push(entry);
        }
        entries.sort_by_key(|entry| entry.score);
        Ok(entries)
    }

    /// The `limit` best entries.
    pub fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut entries = self.entries()?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// Add a win and rewrite the file in score order. Returns the 1-based rank.
    pub fn record(&self, score: u32, name: &str) -> Result<usize> {
        let name = sanitize_name(name);
        if name.is_empty() {
            bail!("player name must not be empty");
        }

        let mut entries = self.entries()?;
        entries.push(LeaderboardEntry {
            score,
            name: name.clone(),
        });
        // Stable sort: earlier wins keep their place among equal scores.
        entries.sort_by_key(|entry| entry.score);
        let rank = entries
            .iter()
            .rposition(|entry| entry.score == score && entry.name == name)
            .map(|index| index + 1)
            .unwrap_or(entries.len());

        self.write_entries(&entries)?;
        info!(score, name = %name, rank, "Leaderboard updated");
        Ok(rank)
    }

    fn write_entries(&self, entries: &[LeaderboardEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

fn sanitize_name(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !ch.is_control())
        .take(MAX_NAME_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}
