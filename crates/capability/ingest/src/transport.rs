//! 传输层抽象。
//!
//! 约定：传输层自行负责断线重连与退避；每次（重新）连上都产生一次
//! `Connected` 事件。会话不跨重连保留订阅。

use async_trait::async_trait;
use rumqttc::QoS;
use std::time::Duration;

/// 传输层错误。
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("subscribe {filter} failed: {reason}")]
    Subscribe { filter: String, reason: String },
    #[error("disconnect error: {0}")]
    Disconnect(String),
}

/// 传输层上报的会话事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected { session_present: bool },
    Message { topic: String, payload: Vec<u8> },
    /// 订阅确认；`rejected` 为被 broker 拒绝的过滤器数量。
    SubscribeAck { rejected: usize },
    Disconnected,
    Idle,
}

#[async_trait]
pub trait Transport: Send {
    /// 等待下一个事件；返回错误表示连接中断，下一次调用会重连。
    async fn poll(&mut self) -> Result<TransportEvent, TransportError>;

    async fn subscribe(&mut self, filter: &str, qos: QoS) -> Result<(), TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}
