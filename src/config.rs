use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub slack: SlackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the HTTP API.
    pub listen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for exported PNG/CSV artifacts. Empty = ./exports.
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Slack Web API base URL (override for testing).
    pub api_base: String,
    /// Bot token. Empty = uploads disabled.
    pub token: String,
    /// Channel ID the artifacts get pushed to.
    pub channel: String,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            export: ExportConfig::default(),
            slack:  SlackConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: "127.0.0.1:5000".into() }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: String::new() }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base: "https://slack.com/api".into(),
            token:    String::new(),
            channel:  String::new(),
        }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(_) => {
                // Write defaults on first run (best-effort)
                let _ = try_write_defaults();
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dfdash").join("dfdash.toml"))
    }

    pub fn export_dir(&self) -> PathBuf {
        if self.export.dir.is_empty() {
            PathBuf::from("exports")
        } else {
            PathBuf::from(&self.export.dir)
        }
    }

    pub fn slack_enabled(&self) -> bool {
        !self.slack.token.is_empty() && !self.slack.channel.is_empty()
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&text)?;
    Ok(cfg)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# dfdash configuration\n# Generated on first run — edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg: Config = toml::from_str(&text).unwrap();
        assert_eq!(cfg.server.listen, "127.0.0.1:5000");
        assert!(!cfg.slack_enabled());
        assert_eq!(cfg.export_dir(), PathBuf::from("exports"));
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let text = "[slack]\napi_base = \"http://localhost:9\"\ntoken = \"xoxb-1\"\nchannel = \"C01\"\n";
        let cfg: Config = toml::from_str(text).unwrap();
        assert!(cfg.slack_enabled());
        assert_eq!(cfg.server.listen, "127.0.0.1:5000");
    }
}
