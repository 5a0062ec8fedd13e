use crate::error::StorageError;
use crate::traits::RecordSink;
use async_trait::async_trait;
use domain::MachineRecord;
use sqlx::PgPool;

const SQL_CREATE: &str = "create table if not exists machine_measurement (\
     machine_id text not null, \
     ts timestamptz not null, \
     field text not null, \
     value text not null, \
     value_type text not null, \
     primary key (machine_id, ts, field))";

const SQL_INSERT: &str = "insert into machine_measurement (machine_id, ts, field, value, value_type) \
     values ($1, $2, $3, $4, $5) \
     on conflict (machine_id, ts, field) do nothing";

pub struct PgRecordSink {
    pub pool: PgPool,
}

impl PgRecordSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建立连接池并确保表结构存在。
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        let sink = Self { pool };
        sink.init_schema().await?;
        Ok(sink)
    }

    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(SQL_CREATE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for PgRecordSink {
    async fn write(&self, record: &MachineRecord) -> Result<(), StorageError> {
        if record.fields.is_empty() {
            return Err(StorageError::new(format!(
                "record for machine {} has no fields",
                record.machine_id
            )));
        }
        let mut tx = self.pool.begin().await?;
        for (field, value) in &record.fields {
            sqlx::query(SQL_INSERT)
                .bind(&record.machine_id)
                .bind(record.ts)
                .bind(field)
                .bind(value.to_string())
                .bind(value.type_name())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), StorageError> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
