use async_trait::async_trait;
use domain::RawMessage;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("connect error: {0}")]
    Connect(String),
    #[error("subscribe error: {0}")]
    Subscribe(String),
}

/// 原始报文处理器。
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError>;
}

/// MQTT 采集源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub topic: String,
}

/// 会话保活间隔。
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// 接收循环单次轮询的时间上限，每个 tick 至多处理一个入站包。
const POLL_TICK: Duration = Duration::from_secs(1);

/// MQTT 采集源。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    /// 建立会话：连接代理、等待会话确认、按 QoS 2 订阅配置主题。
    ///
    /// 会话确认之前的任何错误视为首次连接失败，返回 `Connect` 错误，
    /// 由调用方按致命处理，不在此处重试。
    pub async fn connect(&self) -> Result<MqttSession, IngestError> {
        let client_id = format!("mqtt2influx-{}", uuid::Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_credentials(&self.config.username, &self.config.password);

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => break,
                Ok(_) => {}
                Err(err) => return Err(IngestError::Connect(err.to_string())),
            }
        }

        client
            .subscribe(&self.config.topic, QoS::ExactlyOnce)
            .await
            .map_err(|err| IngestError::Subscribe(err.to_string()))?;
        info!("subscribed to {} at qos 2", self.config.topic);

        Ok(MqttSession {
            client,
            eventloop,
            topic: self.config.topic.clone(),
        })
    }
}

/// 已确认的 MQTT 会话。
pub struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
}

impl MqttSession {
    /// 客户端句柄，供外部中断时发起干净断开。
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    /// 接收循环：逐条投递入站报文给处理器，直到进程被中断。
    ///
    /// 处理器错误只记录不传播；会话建立后的轮询错误同样只记录，
    /// 重连交给客户端在后续轮询中的默认策略。
    pub async fn run(mut self, handler: Arc<dyn RawMessageHandler>) {
        loop {
            let event = match tokio::time::timeout(POLL_TICK, self.eventloop.poll()).await {
                Ok(event) => event,
                // 本 tick 无入站包
                Err(_) => continue,
            };
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = RawMessage {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                    };
                    if let Err(err) = handler.handle(message).await {
                        error!("message handler failed: {}", err);
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // 会话重建后重新订阅
                    if let Err(err) = self.client.subscribe(&self.topic, QoS::ExactlyOnce).await {
                        error!("resubscribe failed: {}", err);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    error!("mqtt session error: {}", err);
                    tokio::time::sleep(POLL_TICK).await;
                }
            }
        }
    }
}
