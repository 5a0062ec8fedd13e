use crate::error::StorageError;
use crate::traits::RecordSink;
use async_trait::async_trait;
use domain::MachineRecord;
use std::collections::HashSet;
use std::sync::RwLock;

/// 内存写入端
///
/// 与真实写入端一致：同一 (机台, 时间, 字段) 只保留首次写入。
#[derive(Default)]
pub struct InMemoryRecordSink {
    records: RwLock<Vec<MachineRecord>>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的记录数（用于测试）
    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 已写入记录的快照
    pub fn records(&self) -> Vec<MachineRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn write(&self, record: &MachineRecord) -> Result<(), StorageError> {
        if record.fields.is_empty() {
            return Err(StorageError::new(format!(
                "record for machine {} has no fields",
                record.machine_id
            )));
        }
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let existing: HashSet<&String> = records
            .iter()
            .filter(|stored| stored.machine_id == record.machine_id && stored.ts == record.ts)
            .flat_map(|stored| stored.fields.keys())
            .collect();
        let mut fresh = record.clone();
        fresh.fields.retain(|field, _| !existing.contains(field));
        if !fresh.fields.is_empty() {
            records.push(fresh);
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
