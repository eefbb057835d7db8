//! Engine configuration.
//!
//! Annualization, the VaR z-score table and the data-quality thresholds are
//! named here instead of being literals inside formula code.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate used when none is supplied (10-year treasury proxy).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.042;

/// Confidence level for the bundled VaR figure.
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;

/// z-score used for confidence levels missing from the table.
pub const DEFAULT_Z_SCORE: f64 = 1.65;

/// Minimum aligned value points before historical metrics are trusted.
pub const MIN_ALIGNED_POINTS: usize = 10;

/// Benchmark ticker (S&P 500).
pub const DEFAULT_BENCHMARK: &str = "^GSPC";

/// One row of the one-sided z-score table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ZScore {
    pub confidence: f64,
    pub z: f64,
}

/// Enumerated z-scores for parametric VaR.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ZScoreTable(pub Vec<ZScore>);

impl ZScoreTable {
    /// Look up the z-score for a confidence level, if it is enumerated.
    pub fn lookup(&self, confidence: f64) -> Option<f64> {
        self.0
            .iter()
            .find(|row| (row.confidence - confidence).abs() < 1e-9)
            .map(|row| row.z)
    }
}

impl Default for ZScoreTable {
    fn default() -> Self {
        Self(vec![
            ZScore { confidence: 0.90, z: 1.28 },
            ZScore { confidence: 0.95, z: 1.65 },
            ZScore { confidence: 0.99, z: 2.33 },
        ])
    }
}

/// Tunable parameters of the metrics pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub trading_days_per_year: f64,
    pub default_risk_free_rate: f64,
    pub var_confidence: f64,
    pub z_scores: ZScoreTable,
    pub default_z_score: f64,
    pub min_aligned_points: usize,
    /// Coverage below this ratio is an error
    pub completeness_error_ratio: f64,
    /// Coverage below this ratio is a warning
    pub completeness_warning_ratio: f64,
    pub benchmark_symbol: String,
    pub cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            default_risk_free_rate: DEFAULT_RISK_FREE_RATE,
            var_confidence: DEFAULT_VAR_CONFIDENCE,
            z_scores: ZScoreTable::default(),
            default_z_score: DEFAULT_Z_SCORE,
            min_aligned_points: MIN_ALIGNED_POINTS,
            completeness_error_ratio: 0.5,
            completeness_warning_ratio: 0.9,
            benchmark_symbol: DEFAULT_BENCHMARK.to_string(),
            cache_ttl_secs: 300,
        }
    }
}

impl EngineConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.folio/config.toml`
    /// Can be overridden with `FOLIO_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }

    /// Load from the default path, falling back to defaults if the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. Missing keys take their default values.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the formulas meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.trading_days_per_year.is_finite() && self.trading_days_per_year > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "trading_days_per_year must be positive (got {})",
                self.trading_days_per_year
            )));
        }
        if !(self.var_confidence > 0.0 && self.var_confidence < 1.0) {
            return Err(Error::InvalidArgument(format!(
                "var_confidence must be in (0, 1) (got {})",
                self.var_confidence
            )));
        }
        if self.completeness_error_ratio > self.completeness_warning_ratio {
            return Err(Error::InvalidArgument(
                "completeness_error_ratio cannot exceed completeness_warning_ratio".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Calculator;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.trading_days_per_year, 252.0);
        assert_eq!(config.default_risk_free_rate, 0.042);
        let calc = Calculator::new(&config);
        assert_eq!(calc.z_score(0.90), 1.28);
        assert_eq!(calc.z_score(0.95), 1.65);
        assert_eq!(calc.z_score(0.99), 2.33);
        assert_eq!(calc.z_score(0.975), 1.65);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
trading_days_per_year = 365.0
benchmark_symbol = "^NDX"

[[z_scores]]
confidence = 0.975
z = 1.96
"#,
        )
        .unwrap();

        let config = EngineConfig::load_from_path(&path).unwrap();
        assert_eq!(config.trading_days_per_year, 365.0);
        assert_eq!(config.benchmark_symbol, "^NDX");
        let calc = Calculator::new(&config);
        assert_eq!(calc.z_score(0.975), 1.96);
        assert_eq!(calc.z_score(0.95), 1.65);
        assert_eq!(config.min_aligned_points, 10);
    }

    #[test]
    fn test_load_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "var_confidence = 1.5\n").unwrap();
        assert!(matches!(
            EngineConfig::load_from_path(&path),
            Err(Error::InvalidArgument(_))
        ));

        fs::write(&path, "trading_days_per_year = \"many\"\n").unwrap();
        assert!(matches!(
            EngineConfig::load_from_path(&path),
            Err(Error::Toml(_))
        ));
    }
}
