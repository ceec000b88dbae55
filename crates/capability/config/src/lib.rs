//! 桥接进程运行配置加载。

use serde::Deserialize;
use std::path::Path;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(String, String),
    #[error("invalid config file {0}: {1}")]
    Parse(String, String),
}

/// 桥接进程运行配置。
///
/// 进程启动时读取一次，生命周期内不可变。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub mqtt: MqttConfig,
    pub influxdb: InfluxConfig,
}

/// `[mqtt]` 配置节。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub topic: String,
}

/// `[influxdb]` 配置节。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl BridgeConfig {
    /// 从分节键值配置文件读取配置。
    ///
    /// 缺失文件、缺失键或类型不符均为 `ConfigError`（启动期致命）。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Read(path.display().to_string(), err.to_string()))?;
        toml::from_str(&text)
            .map_err(|err| ConfigError::Parse(path.display().to_string(), err.to_string()))
    }
}
