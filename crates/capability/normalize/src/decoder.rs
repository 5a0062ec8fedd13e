//! MQTT 报文解码：topic + JSON 报文 → DecodedMessage。
//!
//! 报文为 JSON 对象：
//! - 时间戳取 `timestamp` / `ts` / `time` 中第一个出现的键，
//!   值可以是字符串或 JSON 整数，`null` 视为缺省
//! - 其余键均为字段；嵌套对象以 `.` 拼接展开，`null` 忽略，数组不支持
//! - 机台标识来自 topic 中过滤器第一个 `+` 对应的层
//! - 标识与字段键不得含换行符

use crate::error::DecodeError;
use crate::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use domain::{DecodedMessage, FieldValue, filter_matches, wildcard_segment};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 可作为事件时间的键（按优先级）。
pub const TIMESTAMP_KEYS: [&str; 3] = ["timestamp", "ts", "time"];

/// 绑定到单个订阅过滤器的解码器。
#[derive(Debug, Clone)]
pub struct MessageDecoder {
    filter: String,
}

impl MessageDecoder {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }

    /// 解码一条消息（纯函数，无副作用）。
    pub fn decode(&self, topic: &str, payload: &[u8]) -> Result<DecodedMessage, DecodeError> {
        if !filter_matches(&self.filter, topic) {
            return Err(DecodeError::TopicMismatch {
                topic: topic.to_string(),
                filter: self.filter.clone(),
            });
        }
        let machine_id = wildcard_segment(&self.filter, topic)
            .filter(|segment| !segment.is_empty() && !has_line_break(segment))
            .ok_or_else(|| DecodeError::MissingIdentifier(topic.to_string()))?;

        let value: Value = serde_json::from_slice(payload)
            .map_err(|err| DecodeError::InvalidPayload(err.to_string()))?;
        let Value::Object(object) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let (timestamp_key, event_time) = extract_event_time(&object)?;

        let mut fields = BTreeMap::new();
        for (key, value) in &object {
            if Some(key.as_str()) == timestamp_key {
                continue;
            }
            flatten_field(key.clone(), value, &mut fields)?;
        }
        if fields.is_empty() {
            return Err(DecodeError::MissingFields);
        }

        Ok(DecodedMessage {
            machine_id: machine_id.to_string(),
            fields,
            event_time,
        })
    }
}

fn extract_event_time(
    object: &Map<String, Value>,
) -> Result<(Option<&'static str>, Option<DateTime<Utc>>), DecodeError> {
    let Some((key, value)) = TIMESTAMP_KEYS
        .iter()
        .find_map(|key| object.get(*key).map(|value| (*key, value)))
    else {
        return Ok((None, None));
    };
    let event_time = match value {
        Value::Null => None,
        Value::String(raw) => parse_timestamp(raw)?,
        Value::Number(number) if !number.is_f64() => parse_timestamp(&number.to_string())?,
        _ => return Err(DecodeError::TimestampType(key.to_string())),
    };
    Ok((Some(key), event_time))
}

fn flatten_field(
    key: String,
    value: &Value,
    fields: &mut BTreeMap<String, FieldValue>,
) -> Result<(), DecodeError> {
    if key.is_empty() || key.ends_with('.') || has_line_break(&key) {
        return Err(DecodeError::InvalidFieldKey(key));
    }
    match value {
        Value::Null => {}
        Value::Bool(v) => {
            fields.insert(key, FieldValue::Bool(*v));
        }
        Value::Number(number) => {
            let field = match (number.as_i64(), number.as_f64()) {
                (Some(v), _) => FieldValue::I64(v),
                (None, Some(v)) => FieldValue::F64(v),
                (None, None) => return Err(DecodeError::UnsupportedField(key)),
            };
            fields.insert(key, field);
        }
        Value::String(v) => {
            fields.insert(key, FieldValue::String(v.clone()));
        }
        Value::Object(children) => {
            for (child_key, child) in children {
                flatten_field(format!("{}.{}", key, child_key), child, fields)?;
            }
        }
        Value::Array(_) => return Err(DecodeError::UnsupportedField(key)),
    }
    Ok(())
}

/// 行协议无法转义换行，标识与字段键中一律拒绝。
fn has_line_break(raw: &str) -> bool {
    raw.contains(['\n', '\r'])
}
