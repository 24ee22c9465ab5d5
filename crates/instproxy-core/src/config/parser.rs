//! TOML parser with helpful error messages

use super::ProxyConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse a config file with detailed error messages
pub fn parse_config(path: &Path) -> Result<ProxyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config content from string
pub fn parse_config_str(content: &str) -> Result<ProxyConfig> {
    let config: ProxyConfig =
        toml::from_str(content).map_err(|e| describe_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Point a TOML error at the setting it concerns, e.g. `timeouts.default_secs`.
fn describe_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().trim();
    let Some(offset) = error.span().map(|span| span.start) else {
        return anyhow::anyhow!("Invalid config: {}", message);
    };

    let before = content.get(..offset).unwrap_or(content);
    let line_num = before.matches('\n').count() + 1;
    let line = content.lines().nth(line_num - 1).unwrap_or("").trim();

    match setting_at(content, line_num) {
        Some(setting) => anyhow::anyhow!(
            "Invalid config setting `{}` at line {}: {}\n    {}",
            setting,
            line_num,
            message,
            line
        ),
        None => anyhow::anyhow!("Invalid config at line {}: {}\n    {}", line_num, message, line),
    }
}

/// Dotted name of the key assigned on `line_num` (1-based), qualified by the
/// table header in effect there.
fn setting_at(content: &str, line_num: usize) -> Option<String> {
    let mut table: Option<&str> = None;
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if index + 1 == line_num {
            let (key, _) = line.split_once('=')?;
            let key = key.trim().trim_matches('"');
            if key.is_empty() {
                return None;
            }
            return Some(match table {
                Some(table) => format!("{table}.{key}"),
                None => key.to_string(),
            });
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            table = Some(header.trim());
        }
    }
    None
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &ProxyConfig) -> Result<String> {
    toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration to TOML")
}
