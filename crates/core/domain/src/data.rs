use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// 传输层投递的原始消息。
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl RawEvent {
    /// 以当前时间作为接收时间构造消息。
    pub fn received_now(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

/// 字段值的数据类型。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    I64(i64),
    F64(f64),
    Bool(bool),
    String(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::I64(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::String(v) => f.write_str(v),
        }
    }
}

impl FieldValue {
    /// 类型名（`i64` / `f64` / `bool` / `string`）。
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::I64(_) => "i64",
            FieldValue::F64(_) => "f64",
            FieldValue::Bool(_) => "bool",
            FieldValue::String(_) => "string",
        }
    }
}

/// 解码后的消息，事件时间可能缺省。
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub machine_id: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub event_time: Option<DateTime<Utc>>,
}

impl DecodedMessage {
    /// 补齐时间戳：报文未携带事件时间时使用接收时间。
    pub fn into_record(self, received_at: DateTime<Utc>) -> MachineRecord {
        MachineRecord {
            machine_id: self.machine_id,
            fields: self.fields,
            ts: self.event_time.unwrap_or(received_at),
        }
    }
}

/// 规整后的机台数据点。
#[derive(Debug, Clone, PartialEq)]
pub struct MachineRecord {
    pub machine_id: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub ts: DateTime<Utc>,
}
