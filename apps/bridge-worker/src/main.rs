//! 机台遥测桥接：订阅 MQTT 机台数据并写入时序库。

mod error;
mod ingest;

use error::WorkerError;
use mbridge_config::AppConfig;
use mbridge_ingest::Supervisor;
use mbridge_telemetry::init_tracing;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "mbridge.worker", error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), WorkerError> {
    let config = AppConfig::from_env()?;

    // 1. 时序库：连通性检查失败直接退出
    let sink = ingest::connect_sink(&config).await?;

    // 2. MQTT：首次连接失败直接退出，之后的断线由传输层重连
    let router = ingest::build_router(&config, sink.clone())?;
    let mut supervisor = Supervisor::new(ingest::build_transport(&config), router);
    info!(
        target: "mbridge.worker",
        broker = %config.broker_addr(),
        client_id = %config.mqtt_client_id,
        "mqtt_connecting"
    );
    let connect_timeout = Duration::from_secs(config.mqtt_connect_timeout_seconds);
    if let Err(source) = supervisor.connect(connect_timeout).await {
        sink.close().await;
        return Err(WorkerError::MqttConnect {
            broker: config.broker_addr(),
            source,
        });
    }
    info!(
        target: "mbridge.worker",
        topic = %config.mqtt_topic,
        sink = %ingest::sink_endpoint(&config),
        "bridge_running"
    );

    // 3. 运行直到收到退出信号
    let token = CancellationToken::new();
    tokio::spawn(cancel_on_signal(token.clone()));
    supervisor.run(token).await;

    info!(target: "mbridge.worker", "shutdown_requested");
    supervisor
        .shutdown(Duration::from_millis(config.shutdown_grace_ms))
        .await;
    sink.close().await;
    info!(target: "mbridge.worker", "bridge_stopped");
    Ok(())
}

/// 收到 SIGINT / SIGTERM 时取消 `token`。
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                warn!(target: "mbridge.worker", error = %err, "sigterm_handler_unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    token.cancel();
}
