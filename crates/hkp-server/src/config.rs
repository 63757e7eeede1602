//! Server configuration

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Registered HKP port
pub const DEFAULT_PORT: u16 = 11371;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Answer an add without `keytext` with 400 instead of a silent no-op
    #[serde(default)]
    pub reject_empty_add: bool,
}

fn default_listen_addr() -> SocketAddr {
    ([127, 0, 0, 1], DEFAULT_PORT).into()
}

impl ServerConfig {
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    pub fn with_reject_empty_add(mut self, reject: bool) -> Self {
        self.reject_empty_add = reject;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            reject_empty_add: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr.port(), DEFAULT_PORT);
        assert!(!config.reject_empty_add);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"reject_empty_add": true}"#).unwrap();
        assert!(config.reject_empty_add);
        assert_eq!(config.listen_addr, default_listen_addr());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("hkp-server-config-{}.json", std::process::id()));
        let config = ServerConfig::default()
            .with_listen_addr(([0, 0, 0, 0], 8080).into())
            .with_reject_empty_add(true);

        config.save(&path).unwrap();
        let loaded = ServerConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
