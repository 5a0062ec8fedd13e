//! 写入端接口定义
//!
//! 设计原则：
//! - 实现必须可被多个处理任务并发调用（内部自带连接池）
//! - 写入超时由调用方控制，丢弃 future 即取消请求
//! - 使用 async_trait 支持动态分发（`Arc<dyn RecordSink>`）

use crate::error::StorageError;
use async_trait::async_trait;
use domain::MachineRecord;

/// 时序写入端。
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 写入单条记录。
    async fn write(&self, record: &MachineRecord) -> Result<(), StorageError>;

    /// 连通性检查，启动时调用，失败视为致命错误。
    async fn health(&self) -> Result<(), StorageError>;

    /// 释放连接资源。
    async fn close(&self) {}
}
