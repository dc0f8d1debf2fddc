//! Settings layered as CLI flags over an optional TOML file over defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use url::Url;

use swarmtail_logs::StreamConfig;

/// Management API of a backend running locally on its default port
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub capacity: Option<usize>,
    pub reconnect_delay_secs: Option<u64>,
    pub style_translation: Option<bool>,
    pub export_dir: Option<PathBuf>,
}

impl FileConfig {
    /// `<config_dir>/swarmtail/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("swarmtail").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// An explicit path must exist; the default path is optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub capacity: Option<usize>,
    pub reconnect_delay_secs: Option<u64>,
    pub no_color: bool,
    pub export_dir: Option<PathBuf>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: Url,
    pub stream: StreamConfig,
    pub export_dir: PathBuf,
}

impl Settings {
    /// Merge flags over the file over the view preset (`swarm` or `service`)
    pub fn resolve(overrides: Overrides, file: FileConfig, preset: StreamConfig) -> Result<Self> {
        let raw_url = overrides
            .api_url
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url =
            Url::parse(&raw_url).with_context(|| format!("Invalid API URL '{raw_url}'"))?;

        let capacity = overrides.capacity.or(file.capacity).unwrap_or(preset.capacity);
        if capacity == 0 {
            bail!("Buffer capacity must be at least 1 line");
        }

        let reconnect_delay = overrides
            .reconnect_delay_secs
            .or(file.reconnect_delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(preset.reconnect_delay);
        if reconnect_delay.is_zero() {
            bail!("Reconnect delay must be at least 1 second");
        }

        let style_translation = if overrides.no_color {
            false
        } else {
            file.style_translation.unwrap_or(preset.style_translation)
        };

        let export_dir = overrides
            .export_dir
            .or(file.export_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            api_url,
            stream: StreamConfig {
                capacity,
                reconnect_delay,
                style_translation,
            },
            export_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_preset() {
        let settings =
            Settings::resolve(Overrides::default(), FileConfig::default(), StreamConfig::service())
                .unwrap();
        assert_eq!(settings.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(settings.stream, StreamConfig::service());
        assert_eq!(settings.export_dir, PathBuf::from("."));
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            api_url: Some("https://swarm.example.com/api".to_string()),
            capacity: Some(2000),
            reconnect_delay_secs: Some(10),
            style_translation: Some(true),
            export_dir: Some(PathBuf::from("/tmp/file")),
        };
        let overrides = Overrides {
            capacity: Some(50),
            no_color: true,
            ..Overrides::default()
        };

        let settings = Settings::resolve(overrides, file, StreamConfig::swarm()).unwrap();
        assert_eq!(settings.api_url.host_str(), Some("swarm.example.com"));
        assert_eq!(settings.stream.capacity, 50);
        assert_eq!(settings.stream.reconnect_delay, Duration::from_secs(10));
        assert!(!settings.stream.style_translation);
        assert_eq!(settings.export_dir, PathBuf::from("/tmp/file"));
    }

    #[test]
    fn test_rejects_zero_capacity_and_bad_url() {
        let zero = Overrides {
            capacity: Some(0),
            ..Overrides::default()
        };
        assert!(Settings::resolve(zero, FileConfig::default(), StreamConfig::swarm()).is_err());

        let bad = Overrides {
            api_url: Some("not a url".to_string()),
            ..Overrides::default()
        };
        assert!(Settings::resolve(bad, FileConfig::default(), StreamConfig::swarm()).is_err());
    }

    #[test]
    fn test_rejects_zero_reconnect_delay() {
        let flag = Overrides {
            reconnect_delay_secs: Some(0),
            ..Overrides::default()
        };
        assert!(Settings::resolve(flag, FileConfig::default(), StreamConfig::swarm()).is_err());

        let file = FileConfig {
            reconnect_delay_secs: Some(0),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(Overrides::default(), file, StreamConfig::swarm()).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"http://swarm.local/api\"\ncapacity = 300\nstyle_translation = false\n",
        )
        .unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.api_url.as_deref(), Some("http://swarm.local/api"));
        assert_eq!(file.capacity, Some(300));
        assert_eq!(file.style_translation, Some(false));
        assert!(file.reconnect_delay_secs.is_none());
    }

    #[test]
    fn test_unknown_keys_and_missing_explicit_file_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "colour = true\n").unwrap();
        assert!(FileConfig::load(&path).is_err());

        let missing = dir.path().join("absent.toml");
        assert!(FileConfig::discover(Some(&missing)).is_err());
    }
}
