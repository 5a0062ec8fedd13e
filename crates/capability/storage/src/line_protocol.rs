//! InfluxDB 行协议编码。
//!
//! `measurement,machine_id=<id> k=v,... <ts_ns>`
//!
//! - measurement 转义逗号与空格
//! - tag 键值、字段键转义逗号、等号与空格
//! - 整数加 `i` 后缀，字符串加双引号并转义 `"` 与 `\`
//! - measurement、tag、字段键中的换行无法转义，直接报错

use crate::error::StorageError;
use domain::{FieldValue, MachineRecord};
use std::fmt::Write;

/// 编码单条记录为一行行协议（不含换行）。
pub fn encode_record(measurement: &str, record: &MachineRecord) -> Result<String, StorageError> {
    if record.fields.is_empty() {
        return Err(StorageError::new(format!(
            "record for machine {} has no fields",
            record.machine_id
        )));
    }
    if let Some(name) = std::iter::once(measurement)
        .chain(std::iter::once(record.machine_id.as_str()))
        .chain(record.fields.keys().map(String::as_str))
        .find(|name| name.contains(['\n', '\r']))
    {
        return Err(StorageError::new(format!(
            "line break in identifier {:?}",
            name
        )));
    }
    let ts_ns = record.ts.timestamp_nanos_opt().ok_or_else(|| {
        StorageError::new(format!(
            "timestamp {} outside nanosecond range",
            record.ts.to_rfc3339()
        ))
    })?;

    let mut line = String::new();
    push_escaped(&mut line, measurement, &[',', ' ']);
    line.push_str(",machine_id=");
    push_escaped(&mut line, &record.machine_id, &[',', '=', ' ']);
    line.push(' ');
    for (index, (key, value)) in record.fields.iter().enumerate() {
        if index > 0 {
            line.push(',');
        }
        push_escaped(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        push_field_value(&mut line, value);
    }
    let _ = write!(line, " {}", ts_ns);
    Ok(line)
}

fn push_escaped(out: &mut String, raw: &str, special: &[char]) {
    for ch in raw.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn push_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::I64(v) => {
            let _ = write!(out, "{}i", v);
        }
        FieldValue::F64(v) => {
            let _ = write!(out, "{}", v);
        }
        FieldValue::Bool(v) => {
            let _ = write!(out, "{}", v);
        }
        FieldValue::String(v) => {
            out.push('"');
            push_escaped(out, v, &['"', '\\']);
            out.push('"');
        }
    }
}
