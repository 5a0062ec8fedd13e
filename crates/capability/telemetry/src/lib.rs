//! 日志初始化与消息追踪 ID 生成。

use tracing_subscriber::{EnvFilter, fmt};

/// 初始化 tracing（默认 info，可由 RUST_LOG 覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 message_id，用于关联单条消息的处理日志。
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 创建单条消息处理的 span。
pub fn message_span(message_id: &str, topic: &str) -> tracing::Span {
    tracing::info_span!("message", message_id = %message_id, topic = %topic)
}
