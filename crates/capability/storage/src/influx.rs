//! InfluxDB v1 HTTP API 客户端
//!
//! 覆盖桥接所需的三个操作：
//! - SHOW DATABASES（启动期检查库是否存在）
//! - CREATE DATABASE（缺失时创建一次）
//! - /write（逐报文写入数据点）

use crate::error::StorageError;
use crate::line::encode_point;
use crate::traits::PointWriter;
use async_trait::async_trait;
use domain::DataPoint;
use serde::Deserialize;

/// InfluxDB v1 客户端（静态用户名/口令，单库）。
#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    database: String,
}

/// `/query` 响应的 v1 JSON 结构（只取需要的部分）。
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    series: Vec<QuerySeries>,
}

#[derive(Debug, Deserialize)]
struct QuerySeries {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxClient {
    pub fn new(host: &str, port: u16, username: &str, password: &str, database: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("http://{}:{}", host, port),
            username: username.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// 列出实例上的数据库名。
    pub async fn list_databases(&self) -> Result<Vec<String>, StorageError> {
        let response = self
            .http
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("u", self.username.as_str()),
                ("p", self.password.as_str()),
                ("q", "SHOW DATABASES"),
            ])
            .send()
            .await?;
        let response = error_for_status(response).await?;
        let body: QueryResponse = response
            .json()
            .await
            .map_err(|err| StorageError::Response(err.to_string()))?;
        Ok(database_names(body))
    }

    /// 创建配置的数据库。
    pub async fn create_database(&self) -> Result<(), StorageError> {
        let statement = format!("CREATE DATABASE \"{}\"", self.database);
        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .query(&[
                ("u", self.username.as_str()),
                ("p", self.password.as_str()),
                ("q", statement.as_str()),
            ])
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl PointWriter for InfluxClient {
    async fn write_points(&self, points: &[DataPoint]) -> Result<(), StorageError> {
        let lines = points
            .iter()
            .map(encode_point)
            .collect::<Result<Vec<_>, _>>()?;
        let response = self
            .http
            .post(format!("{}/write", self.base_url))
            .query(&[
                ("db", self.database.as_str()),
                ("u", self.username.as_str()),
                ("p", self.password.as_str()),
            ])
            .body(lines.join("\n"))
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }
}

/// 非 2xx 响应转为 `Api` 错误，附带服务端报错正文。
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Api(status.as_u16(), body))
    }
}

/// SHOW DATABASES 的结果行首列即库名。
fn database_names(response: QueryResponse) -> Vec<String> {
    response
        .results
        .into_iter()
        .flat_map(|result| result.series)
        .flat_map(|series| series.values)
        .filter_map(|row| row.into_iter().next())
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}
