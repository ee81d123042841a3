use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory to display at startup. May also be chosen interactively.
    pub library_path: Option<PathBuf>,
    /// Maximum number of tiles shown in one collage pass.
    pub max_tiles: usize,
    /// Time between collage rotations while rotation is active.
    #[serde(with = "humantime_serde")]
    pub rotation_interval: Duration,
    /// Wake period of the directory watcher loop.
    #[serde(with = "humantime_serde")]
    pub watch_tick: Duration,
    /// Minimum elapsed time between two directory rescans.
    #[serde(with = "humantime_serde")]
    pub rescan_after: Duration,
    /// Delay applied to window resizes before re-composing.
    #[serde(with = "humantime_serde")]
    pub resize_debounce: Duration,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        serde_yaml::from_str(&s).context("parsing YAML configuration")
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.max_tiles > 0, "max-tiles must be greater than zero");
        ensure!(
            self.rotation_interval > Duration::ZERO,
            "rotation-interval must be positive"
        );
        ensure!(
            self.watch_tick > Duration::ZERO,
            "watch-tick must be positive"
        );
        ensure!(
            self.rescan_after >= self.watch_tick,
            "rescan-after must be at least watch-tick"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            library_path: None,
            max_tiles: 12,
            rotation_interval: Duration::from_secs(2),
            watch_tick: Duration::from_millis(500),
            rescan_after: Duration::from_secs(2),
            resize_debounce: Duration::from_millis(100),
        }
    }
}
