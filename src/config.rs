use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Folder under the platform config directory holding config and logs
pub const APP_DIR_NAME: &str = "ArcadeShowdown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read frames from stdin instead of the controller port
    pub test_mode: bool,

    /// Echo every raw line at info level
    pub debug: bool,

    /// Game controller port
    pub port_read: String,
    pub baudrate_read: u32,

    /// Score board port; no score commands are sent when unset
    pub port_write: Option<String>,
    pub baudrate_write: u32,

    /// Clock board port, used for both directions
    pub port_clock: Option<String>,
    pub baudrate_clock: u32,

    /// Match length before the first GAME_ACTIVE
    pub game_len_secs: i64,

    /// Folder holding the cue clips
    pub audio_dir: PathBuf,
    pub audio_enabled: bool,

    /// Serial read poll interval
    pub read_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_mode: false,
            debug: false,
            port_read: "/dev/cu.usbmodem21301".to_string(),
            baudrate_read: 115_200,
            port_write: None,
            baudrate_write: 9600,
            port_clock: None,
            baudrate_clock: 9600,
            game_len_secs: 30,
            audio_dir: PathBuf::from("audio"),
            audio_enabled: true,
            read_timeout_ms: 1000,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Defaults when `path` does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| save_failed(Box::new(e)))?;
            }
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bauds = [
            ("baudrate_read", self.baudrate_read),
            ("baudrate_write", self.baudrate_write),
            ("baudrate_clock", self.baudrate_clock),
        ];
        if let Some((field, _)) = bauds.iter().find(|(_, baud)| *baud == 0) {
            return Err(ConfigError::Invalid(format!("{field} must be positive")));
        }
        if self.game_len_secs <= 0 {
            return Err(ConfigError::Invalid(format!(
                "game_len_secs must be positive, got {}",
                self.game_len_secs
            )));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_ms must be positive".to_string(),
            ));
        }
        if !self.test_mode && self.port_read.trim().is_empty() {
            return Err(ConfigError::Invalid("port_read is empty".to_string()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// `<config_dir>/ArcadeShowdown/config.json`, or `config.json` in the
    /// working directory when the platform has no config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }
}

/// Command line flags; each one overrides the config file
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "arcade-showdown", version, about = "Arcade target game server")]
pub struct Cli {
    /// Read frames from stdin instead of the controller port
    #[arg(long = "test")]
    pub test: bool,

    /// Echo every line read from the devices
    #[arg(long)]
    pub debug: bool,

    /// Baud rate of the controller port
    #[arg(long = "baudrate-read")]
    pub baudrate_read: Option<u32>,

    /// Controller port
    #[arg(long = "port-read")]
    pub port_read: Option<String>,

    /// Baud rate of the score board port
    #[arg(long = "baudrate-write")]
    pub baudrate_write: Option<u32>,

    /// Score board port
    #[arg(long = "port-write")]
    pub port_write: Option<String>,

    /// Clock board port
    #[arg(long = "port-clock")]
    pub port_clock: Option<String>,

    /// Baud rate of the clock board port
    #[arg(long = "baudrate-clock")]
    pub baudrate_clock: Option<u32>,

    /// Match length in seconds before the first GAME_ACTIVE
    #[arg(long = "game-len")]
    pub game_len: Option<i64>,

    /// Folder holding the cue clips
    #[arg(long = "audio-dir")]
    pub audio_dir: Option<PathBuf>,

    /// Run without sound
    #[arg(long = "no-audio")]
    pub no_audio: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Apply the flags that were given on top of `config`
    pub fn apply(&self, mut config: Config) -> Config {
        if self.test {
            config.test_mode = true;
        }
        if self.debug {
            config.debug = true;
        }
        if let Some(baud) = self.baudrate_read {
            config.baudrate_read = baud;
        }
        if let Some(port) = &self.port_read {
            config.port_read = port.clone();
        }
        if let Some(baud) = self.baudrate_write {
            config.baudrate_write = baud;
        }
        if let Some(port) = &self.port_write {
            config.port_write = Some(port.clone());
        }
        if let Some(port) = &self.port_clock {
            config.port_clock = Some(port.clone());
        }
        if let Some(baud) = self.baudrate_clock {
            config.baudrate_clock = baud;
        }
        if let Some(secs) = self.game_len {
            config.game_len_secs = secs;
        }
        if let Some(dir) = &self.audio_dir {
            config.audio_dir = dir.clone();
        }
        if self.no_audio {
            config.audio_enabled = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("arcade-showdown-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.test_mode);
        assert_eq!(config.port_read, "/dev/cu.usbmodem21301");
        assert_eq!(config.baudrate_read, 115_200);
        assert_eq!(config.baudrate_write, 9600);
        assert_eq!(config.baudrate_clock, 9600);
        assert_eq!(config.port_write, None);
        assert_eq!(config.game_len_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"port_write": "/dev/ttyUSB1", "game_len_secs": 45}"#).unwrap();
        assert_eq!(config.port_write.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.game_len_secs, 45);
        assert_eq!(config.baudrate_read, 115_200);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let config = Config {
            port_clock: Some("/dev/ttyACM0".to_string()),
            debug: true,
            ..Config::default()
        };

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_or_default_when_missing() {
        let path = temp_path("missing");
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_baud = Config {
            baudrate_write: 0,
            ..Config::default()
        };
        assert!(zero_baud.validate().unwrap_err().to_string().contains("baudrate_write"));

        let zero_game = Config {
            game_len_secs: 0,
            ..Config::default()
        };
        assert!(zero_game.validate().is_err());

        let zero_timeout = Config {
            read_timeout_ms: 0,
            ..Config::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let cli = Cli::parse_from([
            "arcade-showdown",
            "--test",
            "--port-write",
            "/dev/ttyUSB1",
            "--baudrate-read",
            "57600",
            "--game-len",
            "60",
            "--no-audio",
        ]);
        let file = Config {
            port_clock: Some("/dev/ttyACM0".to_string()),
            ..Config::default()
        };

        let config = cli.apply(file);

        assert!(config.test_mode);
        assert!(!config.audio_enabled);
        assert_eq!(config.port_write.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.port_clock.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.baudrate_read, 57_600);
        assert_eq!(config.baudrate_write, 9600);
        assert_eq!(config.game_len_secs, 60);
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["arcade-showdown"]);
        assert_eq!(cli.apply(Config::default()), Config::default());
        assert_eq!(cli.config_path(), Config::default_path());
    }
}
