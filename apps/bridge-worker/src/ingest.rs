//! 采集链路装配
//!
//! 根据配置组装时序库写入端、消息处理器、路由表与 MQTT 传输层。

use crate::error::WorkerError;
use mbridge_config::{AppConfig, ConfigError, SinkKind, redact_url};
use mbridge_ingest::{MqttTransport, MqttTransportConfig, Router, qos_from_u8};
use mbridge_normalize::MessageDecoder;
use mbridge_pipeline::MachineMessageHandler;
use mbridge_storage::{InfluxConfig, InfluxSink, PgRecordSink, RecordSink, StorageError};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 建立写入端并做连通性检查。
pub async fn connect_sink(config: &AppConfig) -> Result<Arc<dyn RecordSink>, WorkerError> {
    let endpoint = sink_endpoint(config);
    let unreachable = |source: StorageError| WorkerError::SinkUnreachable {
        endpoint: endpoint.clone(),
        source,
    };

    let sink: Arc<dyn RecordSink> = match config.sink_kind {
        SinkKind::Influx => Arc::new(
            InfluxSink::new(InfluxConfig {
                url: config.influx_url.clone(),
                token: config.influx_token.expose().to_string(),
                org: config.influx_org.clone(),
                bucket: config.influx_bucket.clone(),
                measurement: config.influx_measurement.clone(),
            })
            .map_err(unreachable)?,
        ),
        SinkKind::Postgres => {
            let database_url = config
                .database_url
                .as_ref()
                .ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))?;
            Arc::new(
                PgRecordSink::connect(database_url.expose())
                    .await
                    .map_err(unreachable)?,
            )
        }
    };
    sink.health().await.map_err(unreachable)?;

    match config.sink_kind {
        SinkKind::Influx => info!(
            target: "mbridge.worker",
            url = %config.influx_url,
            org = %config.influx_org,
            bucket = %config.influx_bucket,
            "sink_connected"
        ),
        SinkKind::Postgres => info!(target: "mbridge.worker", endpoint = %endpoint, "sink_connected"),
    }
    Ok(sink)
}

/// 机台数据路由：配置的订阅过滤器 → 机台消息处理器。
pub fn build_router(config: &AppConfig, sink: Arc<dyn RecordSink>) -> Result<Router, WorkerError> {
    let handler = MachineMessageHandler::new(
        MessageDecoder::new(&config.mqtt_topic),
        sink,
        Duration::from_millis(config.sink_write_timeout_ms),
    );
    let router = Router::new().route(
        config.mqtt_topic.clone(),
        qos_from_u8(config.mqtt_qos),
        Arc::new(handler),
    )?;
    Ok(router)
}

pub fn build_transport(config: &AppConfig) -> MqttTransport {
    MqttTransport::new(MqttTransportConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        client_id: config.mqtt_client_id.clone(),
        username: config.mqtt_username.clone(),
        password: config
            .mqtt_password
            .as_ref()
            .map(|password| password.expose().to_string()),
        keep_alive: Duration::from_secs(config.mqtt_keep_alive_seconds),
        reconnect_interval: Duration::from_secs(config.mqtt_reconnect_interval_seconds),
    })
}

/// 日志与错误中展示的写入端描述（不含口令）。
pub fn sink_endpoint(config: &AppConfig) -> String {
    match config.sink_kind {
        SinkKind::Influx => format!(
            "influx {} (org={}, bucket={})",
            config.influx_url, config.influx_org, config.influx_bucket
        ),
        SinkKind::Postgres => match &config.database_url {
            Some(url) => format!("postgres {}", redact_url(url.expose())),
            None => "postgres (unset)".to_string(),
        },
    }
}
