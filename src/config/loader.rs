//! Config file loading

use super::HarvestConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SECTION: &str = "repo-harvest";

/// Load configuration from `config_path`, or from a file discovered in `data_dir`.
///
/// Explicit files must parse. Auto-discovered files that fail to parse are
/// reported and replaced by defaults.
pub fn load_config(data_dir: &Path, config_path: Option<&Path>) -> Result<HarvestConfig> {
    let explicit = config_path.is_some();

    let Some(config_file) = config_path.map(Path::to_path_buf).or_else(|| discover_config(data_dir))
    else {
        return Ok(HarvestConfig::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(cfg) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if !explicit => {
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(HarvestConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Parse TOML config, supporting a nested `[repo-harvest]` section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<HarvestConfig> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = raw.get(SECTION).cloned().unwrap_or(raw);

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested `repo-harvest` section.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<HarvestConfig> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = raw.get(SECTION).cloned().unwrap_or(raw);

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(data_dir: &Path) -> Option<PathBuf> {
    let candidates = [
        "repo-harvest.toml",
        ".repo-harvest.toml",
        "harvest.toml",
        "harvest.yml",
        "harvest.yaml",
    ];

    candidates.iter().map(|c| data_dir.join(c)).find(|p| p.exists())
}
