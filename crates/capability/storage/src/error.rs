//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误：
//! - HTTP 传输错误
//! - InfluxDB API 错误响应
//! - 响应结构不符合预期

/// 存储错误。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("http transport error: {0}")]
    Http(String),
    #[error("influxdb api error (status {0}): {1}")]
    Api(u16, String),
    #[error("unexpected query response: {0}")]
    Response(String),
    #[error("unencodable point: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
