//! Snapshot persistence.
//!
//! A snapshot bundles everything one metrics run needs: positions, per-ticker
//! history, the benchmark series and an optional risk-free rate.

use crate::types::{HistoricalData, Position, PricePoint};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs of one metrics run, as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSnapshot {
    pub positions: Vec<Position>,
    #[serde(default)]
    pub historical: HistoricalData,
    #[serde(default)]
    pub benchmark: Vec<PricePoint>,
    /// Annual rate as a decimal; absent means "use the default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_free_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PortfolioSnapshot {
    pub fn new(positions: Vec<Position>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    /// Positions with their ticker-derived fields refreshed.
    ///
    /// Stored classification is never trusted.
    pub fn classified_positions(&self) -> Vec<Position> {
        self.positions
            .iter()
            .cloned()
            .map(Position::classified)
            .collect()
    }
}

/// JSON file holding one [`PortfolioSnapshot`].
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store at the default path.
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default snapshot file path.
    ///
    /// Default path: `~/.folio/snapshot.json`
    /// Can be overridden with `FOLIO_SNAPSHOT_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_SNAPSHOT_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/snapshot.json"))
            .unwrap_or_else(|| PathBuf::from("snapshot.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<PortfolioSnapshot> {
        Self::load_from_path(&self.path)
    }

    /// Load a snapshot. A missing file is an empty snapshot.
    pub fn load_from_path(path: &Path) -> Result<PortfolioSnapshot> {
        if !path.exists() {
            return Ok(PortfolioSnapshot::default());
        }

        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        // Legacy format: a bare list of positions
        if data.is_array() {
            let positions: Vec<Position> = serde_json::from_value(data)?;
            return Ok(PortfolioSnapshot::new(positions));
        }

        Ok(serde_json::from_value(data)?)
    }

    /// Write the snapshot, stamping `saved_at`.
    pub fn save(&self, snapshot: &mut PortfolioSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        snapshot.saved_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
