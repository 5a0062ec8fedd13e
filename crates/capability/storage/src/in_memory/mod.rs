//! 内存写入实现，仅用于测试。

pub mod record;

pub use record::InMemoryRecordSink;
