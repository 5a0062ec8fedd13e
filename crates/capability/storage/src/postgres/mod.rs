//! PostgreSQL / Timescale 写入实现
//!
//! 依赖表 `machine_measurement`（启动时自动创建）：
//!
//! | 列 | 类型 |
//! |----|------|
//! | machine_id | text |
//! | ts | timestamptz |
//! | field | text |
//! | value | text |
//! | value_type | text（`i64` / `f64` / `bool` / `string`） |
//!
//! 主键 `(machine_id, ts, field)`，重复写入忽略。

pub mod record;

pub use record::PgRecordSink;
