use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub server_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3001".to_string(),
            token: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Malformed config at {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Store a new server URL. The old token belongs to the old server.
    pub fn set_server_url(&mut self, raw: &str) -> Result<()> {
        self.server_url = normalize_server_url(raw)?;
        self.token = None;
        self.save()
    }

    pub fn set_token(&mut self, token: Option<String>) -> Result<()> {
        self.token = token;
        self.save()
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".config").join("envoy").join("config.json"))
    }
}

fn normalize_server_url(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw.trim())
        .with_context(|| format!("'{raw}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Server URL must use http or https, got '{}'", url.scheme());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_urls_are_validated_and_trimmed() {
        assert_eq!(
            normalize_server_url(" https://chat.example.com/ ").unwrap(),
            "https://chat.example.com"
        );
        assert_eq!(
            normalize_server_url("http://localhost:3001").unwrap(),
            "http://localhost:3001"
        );
        assert!(normalize_server_url("localhost:3001").is_err());
        assert!(normalize_server_url("ftp://files.example.com").is_err());
    }

    #[test]
    fn token_is_optional_on_disk() {
        let config: Config =
            serde_json::from_str(r#"{ "server_url": "http://localhost:3001" }"#).unwrap();
        assert_eq!(config, Config::default());
    }
}
