//! Emulator configuration file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use securelock_core::ControllerConfig;
use securelock_crypto::AuditKey;
use securelock_network::TcpTelemetryConfig;
use securelock_rfid::ReaderConfig;
use serde::Deserialize;

/// Top level of the TOML file. Missing tables take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    pub reader: ReaderConfig,
    pub telemetry: TelemetrySettings,

    /// User directory (JSON). No file means no enrolled cards. A relative
    /// path read from a file is taken relative to that file.
    pub users: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Monitoring host. Unset keeps audit lines local.
    pub address: Option<SocketAddr>,
    pub timeout_ms: u64,

    /// 64 hex digits. A random key is generated when absent.
    pub audit_key: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            address: None,
            timeout_ms: TcpTelemetryConfig::default().timeout_ms,
            audit_key: None,
        }
    }
}

impl TelemetrySettings {
    pub fn tcp(&self) -> Option<TcpTelemetryConfig> {
        self.address.map(|address| TcpTelemetryConfig {
            address,
            timeout_ms: self.timeout_ms,
        })
    }

    pub fn audit_key(&self) -> Result<Option<AuditKey>> {
        self.audit_key
            .as_deref()
            .map(AuditKey::from_hex)
            .transpose()
            .context("telemetry.audit_key must be 64 hex digits")
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text).context("Failed to parse config file")?;
        config
            .controller
            .validate()
            .context("Invalid [controller] settings")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml(&text)?;
        if let (Some(users), Some(dir)) = (config.users.as_mut(), path.parent()) {
            if users.is_relative() {
                *users = dir.join(&*users);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config = AppConfig::from_toml(include_str!("../config/securelock.toml")).unwrap();
        assert_eq!(config.controller.max_failed_attempts, 3);
        assert_eq!(config.reader.transceive_timeout_ms, 25);
        assert!(config.telemetry.tcp().is_none());
        assert!(config.telemetry.audit_key().unwrap().is_some());
        assert!(config.users.is_some());
    }

    #[test]
    fn test_users_path_relative_to_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/securelock.toml");
        let config = AppConfig::from_file(&path).unwrap();
        let users = config.users.unwrap();
        assert_eq!(
            users,
            Path::new(env!("CARGO_MANIFEST_DIR")).join("config/users.json")
        );
        assert!(users.is_file());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.controller, ControllerConfig::default());
        assert!(config.users.is_none());
        assert!(config.telemetry.audit_key().unwrap().is_none());
    }

    #[test]
    fn test_telemetry_address() {
        let config = AppConfig::from_toml(
            r#"
            [telemetry]
            address = "10.0.0.5:7000"
            timeout_ms = 250
            "#,
        )
        .unwrap();
        let tcp = config.telemetry.tcp().unwrap();
        assert_eq!(tcp.address, "10.0.0.5:7000".parse().unwrap());
        assert_eq!(tcp.timeout_ms, 250);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml("[controller]\nmax_failed_attempts = 0").is_err());
        assert!(AppConfig::from_toml("[telemetry]\naudit_key = \"abcd\"").is_ok());
        let config = AppConfig::from_toml("[telemetry]\naudit_key = \"abcd\"").unwrap();
        assert!(config.telemetry.audit_key().is_err());
    }
}
