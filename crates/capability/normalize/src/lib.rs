//! 报文规整：时间戳解析与 MQTT 报文解码。

pub mod decoder;
pub mod error;
pub mod timestamp;

pub use decoder::{MessageDecoder, TIMESTAMP_KEYS};
pub use error::{DecodeError, ParseError};
pub use timestamp::{
    MILLIS_THRESHOLD, TimestampEncoding, classify_integer, parse_timestamp,
    parse_timestamp_with_encoding,
};
