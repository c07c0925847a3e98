//! Application configuration and per-game options.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tokenizer::{DEFAULT_API_URL, DEFAULT_TIMEOUT};

/// Directory name used under the platform config/data directories.
pub const APP_DIR: &str = "wikibingo";
/// Configuration file name inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Environment variable prefix overriding file settings (`WIKIBINGO_BOARD_SIZE=7`).
pub const ENV_PREFIX: &str = "WIKIBINGO";
/// Board sizes offered by the start menu.
pub const BOARD_SIZES: [usize; 3] = [3, 5, 7];

/// Difficulty label; lower limits overflow sooner and are harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Limit 7.
    Easy,
    /// Limit 5.
    #[default]
    Medium,
    /// Limit 3.
    Hard,
}

impl Difficulty {
    /// Menu order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Cell limit for this difficulty.
    pub const fn limit(self) -> u32 {
        match self {
            Self::Easy => 7,
            Self::Medium => 5,
            Self::Hard => 3,
        }
    }

    /// Inverse of [`Difficulty::limit`].
    pub fn from_limit(limit: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.limit() == limit)
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options consumed by the core when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    /// Side length of the board.
    pub board_size: usize,
    /// Hits a cell absorbs before overflowing.
    pub limit: u32,
}

impl GameOptions {
    /// Options for a `board_size` grid at `difficulty`.
    pub fn new(board_size: usize, difficulty: Difficulty) -> Self {
        Self {
            board_size,
            limit: difficulty.limit(),
        }
    }

    /// Difficulty label matching the limit, if it is one of the standard three.
    pub fn difficulty(&self) -> Option<Difficulty> {
        Difficulty::from_limit(self.limit)
    }
}

impl Default for GameOptions {
    fn default() -> Self {
        Self::new(5, Difficulty::default())
    }
}

/// Settings loaded from `config.toml` and `WIKIBINGO_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Newline-delimited vocabulary file.
    pub vocabulary_path: PathBuf,
    /// CSV leaderboard file.
    pub leaderboard_path: PathBuf,
    /// MediaWiki API endpoint used to fetch articles.
    pub wiki_api_url: String,
    /// Per-request fetch timeout.
    pub fetch_timeout_secs: u64,
    /// Default board size preselected in the menu.
    pub board_size: usize,
    /// Default difficulty preselected in the menu.
    pub difficulty: Difficulty,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vocabulary_path: PathBuf::from("assets").join("words.txt"),
            leaderboard_path: default_data_dir().join("leaderboard.csv"),
            wiki_api_url: DEFAULT_API_URL.to_string(),
            fetch_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            board_size: GameOptions::default().board_size,
            difficulty: Difficulty::default(),
        }
    }
}

impl AppConfig {
    /// Directory holding [`CONFIG_FILE`].
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Default location of the configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Load from the default file, then environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load from `path` (optional) layered over defaults, then environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default(
                "vocabulary_path",
                defaults.vocabulary_path.to_string_lossy().to_string(),
            )?
            .set_default(
                "leaderboard_path",
                defaults.leaderboard_path.to_string_lossy().to_string(),
            )?
            .set_default("wiki_api_url", defaults.wiki_api_url.clone())?
            .set_default("fetch_timeout_secs", defaults.fetch_timeout_secs as i64)?
            .set_default("board_size", defaults.board_size as i64)?
            .set_default("difficulty", defaults.difficulty.label().to_lowercase())?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Options preselected in the start menu.
    pub fn game_options(&self) -> GameOptions {
        GameOptions::new(self.board_size, self.difficulty)
    }

    /// Fetch timeout as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.board_size == 0 {
            bail!("board_size must be at least 1");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be at least 1");
        }
        Ok(())
    }

    fn render_default() -> String {
        let defaults = Self::default();
        format!(
            "# Wiki Bingo configuration\n\
             vocabulary_path = {:?}\n\
             leaderboard_path = {:?}\n\
             wiki_api_url = {:?}\n\
             fetch_timeout_secs = {}\n\
             # 3, 5 or 7\n\
             board_size = {}\n\
             # easy (limit 7), medium (limit 5) or hard (limit 3)\n\
             difficulty = {:?}\n",
            defaults.vocabulary_path.to_string_lossy(),
            defaults.leaderboard_path.to_string_lossy(),
            defaults.wiki_api_url,
            defaults.fetch_timeout_secs,
            defaults.board_size,
            defaults.difficulty.label().to_lowercase(),
        )
    }
}

/// Directory for the leaderboard and other data files.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    ensure_default_config_at(AppConfig::config_path())
}

/// [`ensure_default_config`] for an explicit path.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, AppConfig::render_default())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn difficulty_maps_to_limits() {
        assert_eq!(Difficulty::Hard.limit(), 3);
        assert_eq!(Difficulty::Medium.limit(), 5);
        assert_eq!(Difficulty::Easy.limit(), 7);
        assert_eq!(Difficulty::from_limit(3), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_limit(4), None);
        assert_eq!(GameOptions::new(3, Difficulty::Hard).limit, 3);
        assert_eq!(
            GameOptions::default().difficulty(),
            Some(Difficulty::Medium)
        );
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.board_size, 5);
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.wiki_api_url, DEFAULT_API_URL);
        assert_eq!(config.vocabulary_path, PathBuf::from("assets").join("words.txt"));
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "board_size = 7\ndifficulty = \"hard\"\nvocabulary_path = \"/tmp/words.txt\"\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.game_options(), GameOptions::new(7, Difficulty::Hard));
        assert_eq!(config.vocabulary_path, PathBuf::from("/tmp/words.txt"));
        assert_eq!(config.fetch_timeout(), DEFAULT_TIMEOUT);
        Ok(())
    }

    #[test]
    fn zero_board_size_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "board_size = 0\n")?;
        assert!(AppConfig::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);

        ensure_default_config_at(&path)?;
        assert!(path.exists());
        fs::write(&path, "board_size = 3\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "board_size = 3\n");

        let fresh = dir.path().join("fresh.toml");
        ensure_default_config_at(&fresh)?;
        let config = AppConfig::load_from(&fresh)?;
        assert_eq!(config.board_size, 5);
        assert_eq!(config.difficulty, Difficulty::Medium);
        Ok(())
    }
}
