//! 桥接链路装配模块
//!
//! 该模块负责将桥接的各个组件（MQTT 采集源、报文转换、InfluxDB 写入）组装在一起，
//! 构建完整的处理链路：从代理接收原始报文，转换为数据点后同步写入时序库。
//! 两个外部连接只在启动期建立一次；接收循环中的任何错误只记录不传播。

use domain::RawMessage;
use mqtt2influx_config::BridgeConfig;
use mqtt2influx_ingest::{
    IngestError, MqttSession, MqttSource, MqttSourceConfig, RawMessageHandler,
};
use mqtt2influx_storage::{InfluxClient, PointWriter, StorageError};
use mqtt2influx_telemetry::{
    record_decode_failure, record_raw_message, record_write_failure, record_write_success,
};
use mqtt2influx_transform::transform;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 桥接启动错误（致命，调用方记录后立即退出）。
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to connect to mqtt broker {0}: {1}")]
    Broker(String, String),
    #[error("failed to connect to influxdb instance {0}: {1}")]
    Influx(String, String),
}

/// 报文处理器
///
/// 实现了 `RawMessageHandler` 接口，连接转换与写入两个环节。
/// 转换失败与写入失败均属可恢复：记录错误日志后返回 Ok，
/// 保证一条坏报文不会中断接收循环。
struct BridgeHandler {
    writer: Arc<dyn PointWriter>,
}

#[async_trait::async_trait]
impl RawMessageHandler for BridgeHandler {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError> {
        record_raw_message();
        debug!(
            target: "mqtt2influx.bridge",
            topic = %message.topic,
            payload = %String::from_utf8_lossy(&message.payload),
            "message_received"
        );

        // 1. 转换：解码报文并构造数据点
        let points = match transform(&message.topic, &message.payload) {
            Ok(points) => points,
            Err(err) => {
                record_decode_failure();
                error!(target: "mqtt2influx.bridge", error = %err, "decode_failed");
                return Ok(());
            }
        };
        if points.is_empty() {
            return Ok(());
        }

        // 2. 写入：一条报文对应一次写入调用
        match self.writer.write_points(&points).await {
            Ok(()) => {
                record_write_success();
                info!(
                    target: "mqtt2influx.bridge",
                    measurement = %points[0].measurement,
                    "point_written"
                );
            }
            Err(err) => {
                record_write_failure();
                error!(target: "mqtt2influx.bridge", error = %err, "influx_write_failed");
            }
        }
        Ok(())
    }
}

/// 已初始化的桥接：持有确认后的 MQTT 会话与写入链路。
pub struct Bridge {
    session: MqttSession,
    handler: Arc<BridgeHandler>,
}

impl Bridge {
    /// 建立两个外部连接并完成启动期检查。
    ///
    /// - MQTT：连接代理、等待会话确认、按 QoS 2 订阅配置主题；
    /// - InfluxDB：列出数据库，配置库缺失时创建一次。
    ///
    /// 任一失败返回携带 host:port 上下文的致命错误，不重试。
    pub async fn initialize(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let source = MqttSource::new(MqttSourceConfig {
            host: config.mqtt.host.clone(),
            port: config.mqtt.port,
            username: config.mqtt.username.clone(),
            password: config.mqtt.password.clone(),
            topic: config.mqtt.topic.clone(),
        });
        let session = source.connect().await.map_err(|err| {
            BridgeError::Broker(
                format!("{}:{}", config.mqtt.host, config.mqtt.port),
                err.to_string(),
            )
        })?;

        let influx = InfluxClient::new(
            &config.influxdb.host,
            config.influxdb.port,
            &config.influxdb.username,
            &config.influxdb.password,
            &config.influxdb.database,
        );
        ensure_database(&influx).await.map_err(|err| {
            BridgeError::Influx(
                format!("{}:{}", config.influxdb.host, config.influxdb.port),
                err.to_string(),
            )
        })?;

        Ok(Self {
            session,
            handler: Arc::new(BridgeHandler {
                writer: Arc::new(influx),
            }),
        })
    }

    /// 进入接收循环，直到外部中断；随后干净断开并返回。
    pub async fn run(self) {
        let client = self.session.client();
        let handler: Arc<dyn RawMessageHandler> = self.handler.clone();
        tokio::select! {
            _ = self.session.run(handler) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("stopping mqtt2influx client");
                if let Err(err) = client.disconnect().await {
                    error!("mqtt disconnect failed: {}", err);
                }
            }
        }
    }
}

/// 启动期库检查：配置库缺失时创建（进程生命周期内只执行一次）。
async fn ensure_database(influx: &InfluxClient) -> Result<(), StorageError> {
    let databases = influx.list_databases().await?;
    if !databases.iter().any(|name| name == influx.database()) {
        info!("creating database: {}", influx.database());
        influx.create_database().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DataPoint;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CountingWriter {
        writes: Arc<Mutex<Vec<usize>>>,
    }

    /// 首次写入失败，之后正常计数。
    struct FlakyWriter {
        failed_once: AtomicBool,
        writes: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait::async_trait]
    impl PointWriter for CountingWriter {
        async fn write_points(&self, points: &[DataPoint]) -> Result<(), StorageError> {
            self.writes.lock().await.push(points.len());
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl PointWriter for FlakyWriter {
        async fn write_points(&self, points: &[DataPoint]) -> Result<(), StorageError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(StorageError::Api(500, "forced failure".to_string()));
            }
            self.writes.lock().await.push(points.len());
            Ok(())
        }
    }

    fn message(topic: &str, payload: &[u8]) -> RawMessage {
        RawMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        }
    }

    #[tokio::test]
    async fn valid_message_writes_one_point() {
        let writer = Arc::new(CountingWriter::default());
        let handler = BridgeHandler {
            writer: writer.clone(),
        };
        handler
            .handle(message(
                "sensors/temp1",
                br#"{"timestamp": 1700000000, "value": "21.5"}"#,
            ))
            .await
            .expect("handled");
        let writes = writer.writes.lock().await;
        assert_eq!(writes.as_slice(), &[1]);
    }

    #[tokio::test]
    async fn malformed_payload_is_swallowed() {
        let writer = Arc::new(CountingWriter::default());
        let handler = BridgeHandler {
            writer: writer.clone(),
        };
        handler
            .handle(message("sensors/temp1", b"not json"))
            .await
            .expect("swallowed");
        assert!(writer.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn missing_field_is_swallowed() {
        let writer = Arc::new(CountingWriter::default());
        let handler = BridgeHandler {
            writer: writer.clone(),
        };
        handler
            .handle(message("sensors/temp1", br#"{"value": "21.5"}"#))
            .await
            .expect("swallowed");
        assert!(writer.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn write_failure_does_not_break_subsequent_messages() {
        let writer = Arc::new(FlakyWriter {
            failed_once: AtomicBool::new(false),
            writes: Arc::new(Mutex::new(Vec::new())),
        });
        let handler = BridgeHandler {
            writer: writer.clone(),
        };
        let payload = br#"{"timestamp": 1700000000, "value": "21.5"}"#;

        // 第一条写入失败：错误被记录并吞掉
        handler
            .handle(message("sensors/temp1", payload))
            .await
            .expect("first message swallowed");
        // 同主题的下一条仍被正常处理
        handler
            .handle(message("sensors/temp1", payload))
            .await
            .expect("second message handled");

        let writes = writer.writes.lock().await;
        assert_eq!(writes.as_slice(), &[1]);
    }
}
