//! InfluxDB v2 写入实现

use crate::error::StorageError;
use crate::line_protocol::encode_record;
use crate::traits::RecordSink;
use async_trait::async_trait;
use domain::MachineRecord;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

/// InfluxDB 连接配置。
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
}

pub struct InfluxSink {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org: String,
    bucket: String,
    measurement: String,
}

impl InfluxSink {
    pub fn new(config: InfluxConfig) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| StorageError::new(format!("influx http client: {}", err)))?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token,
            org: config.org,
            bucket: config.bucket,
            measurement: config.measurement,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, format!("Token {}", self.token))
        }
    }
}

#[async_trait]
impl RecordSink for InfluxSink {
    async fn write(&self, record: &MachineRecord) -> Result<(), StorageError> {
        let line = encode_record(&self.measurement, record)?;
        let request = self
            .http
            .post(format!("{}/api/v2/write", self.base_url))
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line);
        let resp = self.authorized(request).send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StorageError::new(format!(
            "influx write rejected ({}): {}",
            status,
            body.trim()
        )))
    }

    async fn health(&self) -> Result<(), StorageError> {
        let request = self.http.get(format!("{}/health", self.base_url));
        let resp = self.authorized(request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StorageError::new(format!(
                "influx health returned {}: {}",
                status,
                body.trim()
            )));
        }
        let health: serde_json::Value = serde_json::from_str(&body)
            .map_err(|err| StorageError::new(format!("influx health body: {}", err)))?;
        match health.get("status").and_then(|value| value.as_str()) {
            Some("pass") => Ok(()),
            other => Err(StorageError::new(format!(
                "influx health status: {}",
                other.unwrap_or("missing")
            ))),
        }
    }
}
