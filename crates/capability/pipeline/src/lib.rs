//! 消息处理链路：解码 → 补齐时间 → 写入时序库。
//!
//! 单条消息的失败只影响这一条：记录日志后以错误返回给路由层，
//! 不重试、不缓存。

use async_trait::async_trait;
use domain::{MachineRecord, RawEvent};
use mbridge_ingest::{IngestError, MessageHandler};
use mbridge_normalize::{DecodeError, MessageDecoder};
use mbridge_storage::{RecordSink, StorageError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 日志中报文预览的最大字符数。
const PAYLOAD_PREVIEW_CHARS: usize = 256;

/// 单条消息处理错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("sink write failed: {0}")]
    Sink(#[from] StorageError),
    #[error("sink write timed out after {0:?}")]
    Timeout(Duration),
}

/// 机台遥测消息处理器。
pub struct MachineMessageHandler {
    decoder: MessageDecoder,
    sink: Arc<dyn RecordSink>,
    write_timeout: Duration,
}

impl MachineMessageHandler {
    pub fn new(decoder: MessageDecoder, sink: Arc<dyn RecordSink>, write_timeout: Duration) -> Self {
        Self {
            decoder,
            sink,
            write_timeout,
        }
    }

    /// 处理一条消息，成功时返回写入的记录。
    pub async fn process(&self, event: RawEvent) -> Result<MachineRecord, PipelineError> {
        let decoded = match self.decoder.decode(&event.topic, &event.payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(
                    target: "mbridge.pipeline",
                    topic = %event.topic,
                    payload = %payload_preview(&event.payload),
                    error = %err,
                    "decode_failed"
                );
                return Err(err.into());
            }
        };
        let event_time_present = decoded.event_time.is_some();
        let record = decoded.into_record(event.received_at);

        match tokio::time::timeout(self.write_timeout, self.sink.write(&record)).await {
            Ok(Ok(())) => {
                debug!(
                    target: "mbridge.pipeline",
                    machine_id = %record.machine_id,
                    fields = record.fields.len(),
                    ts = %record.ts.to_rfc3339(),
                    event_time_present,
                    "record_written"
                );
                Ok(record)
            }
            Ok(Err(err)) => {
                warn!(
                    target: "mbridge.pipeline",
                    machine_id = %record.machine_id,
                    error = %err,
                    "sink_write_failed"
                );
                Err(err.into())
            }
            Err(_) => {
                warn!(
                    target: "mbridge.pipeline",
                    machine_id = %record.machine_id,
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "sink_write_timeout"
                );
                Err(PipelineError::Timeout(self.write_timeout))
            }
        }
    }
}

#[async_trait]
impl MessageHandler for MachineMessageHandler {
    async fn handle(&self, event: RawEvent) -> Result<(), IngestError> {
        self.process(event)
            .await
            .map(|_| ())
            .map_err(|err| IngestError::Handler(err.to_string()))
    }
}

fn payload_preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    if text.chars().count() <= PAYLOAD_PREVIEW_CHARS {
        return text.into_owned();
    }
    let mut preview: String = text.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
    preview.push('…');
    preview
}
