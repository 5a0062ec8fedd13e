//! 时间戳规整。
//!
//! 按固定优先级尝试三种编码：
//!
//! 1. RFC3339（带时区偏移，如 `2024-01-01T00:00:00Z`）
//! 2. 十进制整数，绝对值大于 10^12 时按 Unix 毫秒解释
//! 3. 其余整数按 Unix 秒解释
//!
//! 10^12 阈值是经验规则而非格式标记：2001 年之后的毫秒时间戳都大于它，
//! 而任何现实日期的秒时间戳都远小于它。恰好等于 ±10^12 时走秒分支。
//!
//! 空字符串表示“无时间戳”，返回 `Ok(None)`，与解析失败区分。
//! 不做首尾空白裁剪。RFC3339 只接受大写 `T` 分隔与大写 `Z`，
//! 空格分隔或小写形式按格式错误处理。

use crate::error::ParseError;
use chrono::{DateTime, Utc};
use std::num::IntErrorKind;

/// 毫秒/秒判定阈值（不含）。
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// 识别出的时间戳编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampEncoding {
    Rfc3339,
    UnixSeconds,
    UnixMillis,
}

/// 按数量级判断整数时间戳的单位。
pub fn classify_integer(value: i64) -> TimestampEncoding {
    if value > MILLIS_THRESHOLD || value < -MILLIS_THRESHOLD {
        TimestampEncoding::UnixMillis
    } else {
        TimestampEncoding::UnixSeconds
    }
}

/// 解析时间戳字符串。
pub fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Utc>>, ParseError> {
    Ok(parse_timestamp_with_encoding(raw)?.map(|(ts, _)| ts))
}

/// 解析时间戳字符串，并返回命中的编码。
pub fn parse_timestamp_with_encoding(
    raw: &str,
) -> Result<Option<(DateTime<Utc>, TimestampEncoding)>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if is_strict_rfc3339_shape(raw) {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some((ts.with_timezone(&Utc), TimestampEncoding::Rfc3339)));
        }
    }

    let value = raw.parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ParseError::Overflow(raw.to_string())
        }
        _ => ParseError::Malformed(raw.to_string()),
    })?;

    let encoding = classify_integer(value);
    let ts = match encoding {
        // 向下取整拆分，余数恒为非负，秒数随之退一
        TimestampEncoding::UnixMillis => {
            let secs = value.div_euclid(1000);
            let nanos = (value.rem_euclid(1000) * 1_000_000) as u32;
            DateTime::from_timestamp(secs, nanos)
        }
        _ => DateTime::from_timestamp(value, 0),
    };
    let ts = ts.ok_or(ParseError::OutOfRange(value))?;
    Ok(Some((ts, encoding)))
}

/// chrono 额外接受空格分隔与小写 `t`/`z`，这里先排除。
fn is_strict_rfc3339_shape(raw: &str) -> bool {
    raw.as_bytes().get(10) == Some(&b'T') && !raw.contains(['t', 'z'])
}
