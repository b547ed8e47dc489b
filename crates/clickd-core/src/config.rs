use crate::keymap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub layer: LayerConfig,
    #[serde(default)]
    pub buttons: ButtonsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "GeneralConfig::default_enabled")]
    pub enabled: bool,
    /// How often the motion sample is delivered to the click layer.
    #[serde(default = "GeneralConfig::default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl GeneralConfig {
    fn default_enabled() -> bool { true }
    fn default_poll_interval() -> u64 { 10 }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Accumulated |dx| + |dy| needed before the layer turns on.
    /// 0 means the second moving tick turns it on.
    #[serde(default = "ActivationConfig::default_movement_threshold")]
    pub movement_threshold: u32,
    /// No motion for this long while active turns the layer off.
    #[serde(default = "ActivationConfig::default_active_timeout")]
    pub active_timeout_ms: u64,
    /// No motion for this long while armed drops back to idle.
    #[serde(default = "ActivationConfig::default_armed_timeout")]
    pub armed_timeout_ms: u64,
}

impl ActivationConfig {
    fn default_movement_threshold() -> u32 { 0 }
    fn default_active_timeout() -> u64 { 800 }
    fn default_armed_timeout() -> u64 { 50 }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 0,
            active_timeout_ms: 800,
            armed_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    #[serde(default = "LayerConfig::default_id")]
    pub id: u8,
}

impl LayerConfig {
    fn default_id() -> u8 { 4 }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { id: 4 }
    }
}

/// Physical keys that act as mouse buttons while the click layer is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonsConfig {
    #[serde(default = "ButtonsConfig::default_btn1")]
    pub btn1: String,
    #[serde(default = "ButtonsConfig::default_btn2")]
    pub btn2: String,
    #[serde(default = "ButtonsConfig::default_btn3")]
    pub btn3: String,
}

impl ButtonsConfig {
    fn default_btn1() -> String { "j".into() }
    fn default_btn2() -> String { "l".into() }
    fn default_btn3() -> String { "semicolon".into() }
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        Self {
            btn1: "j".into(),
            btn2: "l".into(),
            btn3: "semicolon".into(),
        }
    }
}

impl ButtonsConfig {
    /// Key codes for btn1..btn3, in button order.
    pub fn key_codes(&self) -> Result<[u16; 3]> {
        let resolve = |slot: &str, name: &str| {
            keymap::key_code(name)
                .with_context(|| format!("unknown key name '{}' for buttons.{}", name, slot))
        };
        Ok([
            resolve("btn1", &self.btn1)?,
            resolve("btn2", &self.btn2)?,
            resolve("btn3", &self.btn3)?,
        ])
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("clickd")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "parsing config TOML")
    }

    /// Reject configurations the click layer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.general.poll_interval_ms == 0 {
            anyhow::bail!("general.poll_interval_ms must be greater than 0");
        }

        let activation = &self.activation;
        if activation.armed_timeout_ms >= activation.active_timeout_ms {
            anyhow::bail!(
                "activation.armed_timeout_ms ({}) must be shorter than activation.active_timeout_ms ({})",
                activation.armed_timeout_ms,
                activation.active_timeout_ms
            );
        }

        let codes = self.buttons.key_codes()?;
        for i in 0..codes.len() {
            for j in i + 1..codes.len() {
                if codes[i] == codes[j] {
                    anyhow::bail!(
                        "buttons.btn{} and buttons.btn{} are bound to the same key",
                        i + 1,
                        j + 1
                    );
                }
            }
        }

        Ok(())
    }
}

pub fn socket_path() -> PathBuf {
    // CLICKD_SOCK env var overrides for testing.
    // Default: /run/clickd/clickd.sock (created by RuntimeDirectory=clickd in systemd).
    if let Ok(path) = std::env::var("CLICKD_SOCK") {
        return PathBuf::from(path);
    }
    PathBuf::from("/run/clickd/clickd.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- defaults ---

    #[test]
    fn default_active_timeout_is_800ms() {
        let config = Config::default();
        assert_eq!(config.activation.active_timeout_ms, 800);
    }

    #[test]
    fn default_armed_timeout_is_50ms() {
        let config = Config::default();
        assert_eq!(config.activation.armed_timeout_ms, 50);
    }

    #[test]
    fn default_movement_threshold_is_zero() {
        let config = Config::default();
        assert_eq!(config.activation.movement_threshold, 0);
    }

    #[test]
    fn default_layer_is_4() {
        let config = Config::default();
        assert_eq!(config.layer.id, 4);
    }

    #[test]
    fn default_enabled_with_10ms_poll() {
        let config = Config::default();
        assert!(config.general.enabled);
        assert_eq!(config.general.poll_interval_ms, 10);
    }

    #[test]
    fn default_buttons_are_j_l_semicolon() {
        let config = Config::default();
        assert_eq!(config.buttons.key_codes().unwrap(), [36, 38, 39]);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    // --- TOML parsing ---

    #[test]
    fn parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.activation.active_timeout_ms, 800);
        assert_eq!(config.activation.armed_timeout_ms, 50);
        assert_eq!(config.layer.id, 4);
        assert_eq!(config.buttons.btn1, "j");
    }

    #[test]
    fn parse_custom_activation() {
        let toml = r#"
[activation]
movement_threshold = 40
active_timeout_ms = 1200
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.activation.movement_threshold, 40);
        assert_eq!(config.activation.active_timeout_ms, 1200);
        // Untouched fields keep their defaults
        assert_eq!(config.activation.armed_timeout_ms, 50);
    }

    #[test]
    fn parse_buttons_and_layer() {
        let toml = r#"
[layer]
id = 2

[buttons]
btn1 = "KEY_F"
btn2 = "g"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.layer.id, 2);
        assert_eq!(config.buttons.key_codes().unwrap(), [33, 34, 39]);
    }

    #[test]
    fn parse_disabled() {
        let toml = r#"
[general]
enabled = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.general.enabled);
    }

    // --- validation ---

    #[test]
    fn validate_rejects_unknown_key_name() {
        let mut config = Config::default();
        config.buttons.btn2 = "hyper".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("buttons.btn2"));
    }

    #[test]
    fn validate_rejects_duplicate_bindings() {
        let mut config = Config::default();
        config.buttons.btn3 = "KEY_J".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("btn1 and buttons.btn3"));
    }

    #[test]
    fn validate_rejects_armed_timeout_not_shorter_than_active() {
        let mut config = Config::default();
        config.activation.armed_timeout_ms = 800;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.general.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_missing_file_fails_with_path() {
        let err = Config::load_from(Path::new("/nonexistent/clickd.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/clickd.toml"));
    }

    // --- socket path ---

    #[test]
    fn socket_path_ends_with_clickd_sock() {
        let path = socket_path();
        assert_eq!(path.file_name().unwrap(), "clickd.sock");
    }
}
