//! # Config CLI
//!
//! Resolves the effective [`LedgerConfig`] (file, then environment) and
//! prints it with `railbook config`.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use railbook_ledger::LedgerConfig;

/// Output format for `railbook config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// YAML, loadable with `--config`.
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Arguments for `railbook config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = ConfigFormat::Yaml)]
    pub format: ConfigFormat,
}

/// Load the configuration file if one was given, then apply environment
/// overrides.
pub fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    let base = match path {
        Some(path) => LedgerConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    let config = base
        .with_env_overrides()
        .context("applying environment overrides")?;
    tracing::debug!(?config, "resolved ledger configuration");
    Ok(config)
}

/// Render `config` in the requested format.
pub fn render_config(config: &LedgerConfig, format: ConfigFormat) -> Result<String> {
    let rendered = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)? + "\n",
    };
    Ok(rendered)
}

/// Execute `railbook config`.
pub fn run_config(args: &ConfigArgs, config: &LedgerConfig) -> Result<u8> {
    print!("{}", render_config(config, args.format)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn yaml_output_reloads() {
        let config = LedgerConfig {
            refund_cutoff_ms: 900_000,
            ..LedgerConfig::default()
        };
        let yaml = render_config(&config, ConfigFormat::Yaml).unwrap();
        assert_eq!(LedgerConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn json_output_names_fields() {
        let json = render_config(&LedgerConfig::default(), ConfigFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["refund_cutoff_ms"], 3_600_000);
        assert_eq!(value["max_seat_capacity"], 10_000);
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_seat_capacity: 12").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.max_seat_capacity, 12);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/railbook.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/railbook.yaml"));
    }
}
