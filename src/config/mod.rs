// src/config/mod.rs
//! Configuration loading. Supplied configuration is the only source of truth:
//! when no file can be found the loader errors instead of inventing defaults.

pub mod analysis;

pub use analysis::{AnalysisConfig, CategoryRule, RiskConfig, ScoringConfig, ToneAffinity, ToneLexicon};

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "SUBREDDIT_ANALYSIS_CONFIG";
pub const DEFAULT_TOML_PATH: &str = "config/analysis.toml";
pub const DEFAULT_JSON_PATH: &str = "config/analysis.json";

/// Load and validate a config from an explicit path. TOML or JSON.
pub fn load_config_from(path: &Path) -> Result<AnalysisConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading analysis config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing analysis config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validating analysis config {}", path.display()))?;
    tracing::info!(
        target: "config",
        path = %path.display(),
        categories = cfg.categories.len(),
        risk_categories = ?cfg.risk.categories,
        "analysis config loaded"
    );
    Ok(cfg)
}

/// Resolve the config path and load it:
/// 1) $SUBREDDIT_ANALYSIS_CONFIG
/// 2) config/analysis.toml
/// 3) config/analysis.json
pub fn load_config_default() -> Result<AnalysisConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_config_from(&pb);
        }
    }
    Err(anyhow!(
        "no analysis config found (set {ENV_CONFIG_PATH} or create {DEFAULT_TOML_PATH})"
    ))
}

/// Parse config text. The extension picks the format; unknown extensions
/// try TOML first, then JSON.
pub fn parse_config(s: &str, hint_ext: &str) -> Result<AnalysisConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => toml::from_str(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| serde_json::from_str(s).map_err(anyhow::Error::from))
            .context("config is neither TOML nor JSON"),
    }
}
