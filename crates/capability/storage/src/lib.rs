//! # 时序写入端
//!
//! 将 [`domain::MachineRecord`] 写入时序库：
//!
//! - [`influx`]：InfluxDB v2 HTTP 写入（行协议，纳秒精度）
//! - [`postgres`]：PostgreSQL / Timescale，每个字段一行，主键冲突忽略
//! - [`in_memory`]：内存实现，用于测试
//!
//! 同一 (机台, 时间, 字段) 重复写入不会产生重复数据：InfluxDB 以相同
//! series + 时间覆盖旧点，Postgres 使用 `on conflict do nothing`。

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod influx;
pub mod line_protocol;
pub mod postgres;
pub mod traits;

pub use connection::connect_pool;
pub use error::StorageError;
pub use in_memory::InMemoryRecordSink;
pub use influx::{InfluxConfig, InfluxSink};
pub use line_protocol::encode_record;
pub use postgres::PgRecordSink;
pub use traits::RecordSink;
