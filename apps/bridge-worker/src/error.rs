use mbridge_config::ConfigError;
use mbridge_ingest::{IngestError, TransportError};
use mbridge_storage::StorageError;

/// 启动期致命错误，进程以非零状态退出。
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("sink unreachable at {endpoint}: {source}")]
    SinkUnreachable {
        endpoint: String,
        source: StorageError,
    },
    #[error("mqtt connect to {broker} failed: {source}")]
    MqttConnect {
        broker: String,
        source: TransportError,
    },
    #[error("router setup failed: {0}")]
    Router(#[from] IngestError),
}
