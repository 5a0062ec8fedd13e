//! 数据接入：MQTT 会话监管、订阅重建与消息路由。

pub mod mqtt;
pub mod router;
pub mod supervisor;
pub mod transport;

pub use mqtt::{MqttTransport, MqttTransportConfig, qos_from_u8};
pub use router::{Route, Router};
pub use rumqttc::QoS;
pub use supervisor::{SessionState, Supervisor};
pub use transport::{Transport, TransportError, TransportEvent};

use async_trait::async_trait;
use domain::RawEvent;

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no route for topic {0}")]
    NoRoute(String),
    #[error("invalid topic filter: {0}")]
    InvalidFilter(String),
    #[error("handler error: {0}")]
    Handler(String),
}

/// 消息处理器：每条投递的消息调用一次，返回值仅用于日志。
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, event: RawEvent) -> Result<(), IngestError>;
}
