//! 基于 rumqttc 的 MQTT 传输层。

use crate::transport::{Transport, TransportError, TransportEvent};
use async_trait::async_trait;
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubscribeReasonCode,
};
use std::time::Duration;

/// 断开连接时等待 DISCONNECT 报文发出的上限。
const DISCONNECT_DRAIN: Duration = Duration::from_millis(250);

/// MQTT 传输层配置。
#[derive(Debug, Clone)]
pub struct MqttTransportConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    /// 两次重连尝试之间的等待。
    pub reconnect_interval: Duration,
}

/// MQTT 传输层。
///
/// 使用 clean session：broker 不跨重连保留订阅，由上层在每次
/// `Connected` 后重新订阅。
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    reconnect_interval: Duration,
    connection_failed: bool,
}

impl MqttTransport {
    pub fn new(config: MqttTransportConfig) -> Self {
        let mut options = MqttOptions::new(config.client_id, config.host, config.port);
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(true);
        if let Some(username) = config.username {
            options.set_credentials(username, config.password.unwrap_or_default());
        }
        let (client, eventloop) = AsyncClient::new(options, 10);
        Self {
            client,
            eventloop,
            reconnect_interval: config.reconnect_interval,
            connection_failed: false,
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        if self.connection_failed {
            tokio::time::sleep(self.reconnect_interval).await;
            self.connection_failed = false;
        }
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => Ok(TransportEvent::Connected {
                session_present: ack.session_present,
            }),
            Ok(Event::Incoming(Packet::Publish(publish))) => Ok(TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                let rejected = ack
                    .return_codes
                    .iter()
                    .filter(|code| matches!(code, SubscribeReasonCode::Failure))
                    .count();
                Ok(TransportEvent::SubscribeAck { rejected })
            }
            Ok(Event::Incoming(Packet::Disconnect)) => Ok(TransportEvent::Disconnected),
            Ok(_) => Ok(TransportEvent::Idle),
            Err(err) => {
                self.connection_failed = true;
                Err(TransportError::Connection(err.to_string()))
            }
        }
    }

    async fn subscribe(&mut self, filter: &str, qos: QoS) -> Result<(), TransportError> {
        self.client
            .subscribe(filter, qos)
            .await
            .map_err(|err| TransportError::Subscribe {
                filter: filter.to_string(),
                reason: err.to_string(),
            })
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.client
            .disconnect()
            .await
            .map_err(|err| TransportError::Disconnect(err.to_string()))?;
        let eventloop = &mut self.eventloop;
        let drain = async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        let _ = tokio::time::timeout(DISCONNECT_DRAIN, drain).await;
        Ok(())
    }
}

/// 数值 QoS 转换，非法值按 AtLeastOnce 处理。
pub fn qos_from_u8(value: u8) -> QoS {
    match value {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}
