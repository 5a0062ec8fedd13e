//! 规整错误类型。

/// 时间戳解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// 既不是 RFC3339 也不是十进制整数。
    #[error("malformed timestamp: {0:?}")]
    Malformed(String),
    /// 整数超出 i64 范围。
    #[error("timestamp exceeds i64 range: {0:?}")]
    Overflow(String),
    /// 整数合法，但无法表示为时间点。
    #[error("timestamp {0} is outside the representable range")]
    OutOfRange(i64),
}

/// 报文解码错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("topic {topic} does not match filter {filter}")]
    TopicMismatch { topic: String, filter: String },
    #[error("topic {0} carries no machine identifier")]
    MissingIdentifier(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] ParseError),
    #[error("timestamp field {0} must be a string or an integer")]
    TimestampType(String),
    #[error("unsupported value for field {0}")]
    UnsupportedField(String),
    #[error("invalid field key: {0:?}")]
    InvalidFieldKey(String),
    #[error("payload carries no fields")]
    MissingFields,
}
