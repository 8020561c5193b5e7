use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level pluvio configuration.
///
/// Every table and field is optional; an empty file equals the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluvioConfig {
    /// IDF fitting settings.
    #[serde(default)]
    pub idf: IdfToml,

    /// SPI settings.
    #[serde(default)]
    pub spi: SpiToml,

    /// Batch processing settings.
    #[serde(default)]
    pub batch: BatchToml,
}

impl PluvioConfig {
    /// Read a TOML file, or return defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&text).context("failed to parse TOML config")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdfToml {
    #[serde(default = "default_initial_guess")]
    pub initial_guess: [f64; 4],
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    #[serde(default = "default_floor")]
    pub return_period_floor: f64,
    #[serde(default = "default_floor")]
    pub duration_floor: f64,
    #[serde(default = "default_penalty")]
    pub penalty: f64,
}

impl Default for IdfToml {
    fn default() -> Self {
        Self {
            initial_guess: default_initial_guess(),
            max_evaluations: default_max_evaluations(),
            min_rows: default_min_rows(),
            return_period_floor: default_floor(),
            duration_floor: default_floor(),
            penalty: default_penalty(),
        }
    }
}

fn default_initial_guess() -> [f64; 4] {
    [500.0, 0.1, 5.0, 0.3]
}
fn default_max_evaluations() -> usize {
    1000
}
fn default_min_rows() -> usize {
    5
}
fn default_floor() -> f64 {
    1e-6
}
fn default_penalty() -> f64 {
    1e6
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpiToml {
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,
    #[serde(default = "default_min_positive")]
    pub min_positive: usize,
    #[serde(default = "default_cdf_clip")]
    pub cdf_clip: f64,
}

impl Default for SpiToml {
    fn default() -> Self {
        Self {
            min_occurrences: default_min_occurrences(),
            min_positive: default_min_positive(),
            cdf_clip: default_cdf_clip(),
        }
    }
}

fn default_min_occurrences() -> usize {
    3
}
fn default_min_positive() -> usize {
    2
}
fn default_cdf_clip() -> f64 {
    1e-10
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchToml {
    /// Worker threads; `None` lets rayon decide.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Include the 143-row intensity table in per-station reports.
    #[serde(default = "default_true")]
    pub include_table: bool,
}

impl Default for BatchToml {
    fn default() -> Self {
        Self {
            threads: None,
            include_table: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: PluvioConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.idf.initial_guess, [500.0, 0.1, 5.0, 0.3]);
        assert_eq!(cfg.idf.max_evaluations, 1000);
        assert_eq!(cfg.spi.min_occurrences, 3);
        assert!(cfg.batch.threads.is_none());
        assert!(cfg.batch.include_table);
    }

    #[test]
    fn partial_tables() {
        let cfg: PluvioConfig = toml::from_str(
            r#"
            [idf]
            max_evaluations = 200

            [spi]
            cdf_clip = 1e-8

            [batch]
            threads = 4
            include_table = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.idf.max_evaluations, 200);
        assert_eq!(cfg.idf.min_rows, 5);
        assert!((cfg.spi.cdf_clip - 1e-8).abs() < f64::EPSILON);
        assert_eq!(cfg.spi.min_positive, 2);
        assert_eq!(cfg.batch.threads, Some(4));
        assert!(!cfg.batch.include_table);
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<PluvioConfig>("[idf]\nbogus = 1\n").is_err());
        assert!(toml::from_str::<PluvioConfig>("[plots]\n").is_err());
    }

    #[test]
    fn load_none_is_default() {
        let cfg = PluvioConfig::load(None).unwrap();
        assert_eq!(cfg.idf.penalty, 1e6);
    }

    #[test]
    fn load_missing_file_errors() {
        let err = PluvioConfig::load(Some(Path::new("/tmp/pluvio_missing_config.toml")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
