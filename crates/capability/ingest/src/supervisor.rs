//! 会话监管：连接、订阅重建、消息分发与优雅退出。
//!
//! 状态机：
//!
//! ```text
//! Disconnected --Connected--> Subscribing --全部成功--> Active
//!                                         \--任一失败--> Degraded
//! Active/Degraded --连接中断--> Disconnected
//! ```
//!
//! 每次 `Connected` 都按路由表完整重新订阅，不依赖 broker 保留会话。
//! 单条消息在独立任务中处理，处理失败只记录日志，不影响会话状态。

use crate::router::Router;
use crate::transport::{Transport, TransportError, TransportEvent};
use chrono::Utc;
use domain::RawEvent;
use mbridge_telemetry::{message_span, new_message_id};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, warn};

/// 会话状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Subscribing,
    /// 已连接，但至少一个订阅失败或被拒绝。
    Degraded,
    Active,
}

pub struct Supervisor<T: Transport> {
    transport: T,
    router: Arc<Router>,
    tracker: TaskTracker,
    state: watch::Sender<SessionState>,
}

impl<T: Transport> Supervisor<T> {
    pub fn new(transport: T, router: Router) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            router: Arc::new(router),
            tracker: TaskTracker::new(),
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// 订阅状态变化。
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// 建立首次连接并完成订阅。
    ///
    /// 首次连接失败或超时直接返回错误，由调用方决定退出。
    pub async fn connect(&mut self, timeout: Duration) -> Result<(), TransportError> {
        match tokio::time::timeout(timeout, self.wait_connected()).await {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::ConnectTimeout(timeout)),
        }
        info!(target: "mbridge.ingest", "mqtt_connected");
        self.resubscribe().await;
        Ok(())
    }

    /// 事件循环，直到 `token` 被取消。
    ///
    /// 连接中断后由传输层负责重连，这里只跟踪状态。
    pub async fn run(&mut self, token: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = token.cancelled() => break,
                event = self.transport.poll() => event,
            };
            match event {
                Ok(TransportEvent::Connected { session_present }) => {
                    info!(target: "mbridge.ingest", session_present, "mqtt_connected");
                    self.resubscribe().await;
                }
                Ok(TransportEvent::Message { topic, payload }) => {
                    self.dispatch(RawEvent {
                        topic,
                        payload,
                        received_at: Utc::now(),
                    });
                }
                Ok(TransportEvent::SubscribeAck { rejected }) if rejected > 0 => {
                    warn!(target: "mbridge.ingest", rejected, "subscribe_rejected");
                    self.set_state(SessionState::Degraded);
                }
                Ok(TransportEvent::SubscribeAck { .. }) | Ok(TransportEvent::Idle) => {}
                Ok(TransportEvent::Disconnected) => {
                    warn!(target: "mbridge.ingest", "mqtt_disconnected_by_broker");
                    self.set_state(SessionState::Disconnected);
                }
                Err(err) => {
                    warn!(target: "mbridge.ingest", error = %err, "mqtt_connection_lost");
                    self.set_state(SessionState::Disconnected);
                }
            }
        }
        debug!(target: "mbridge.ingest", in_flight = self.tracker.len(), "supervisor_stopped");
    }

    /// 优雅退出：等待在途消息（最多 `grace`），然后断开连接。
    pub async fn shutdown(mut self, grace: Duration) {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                target: "mbridge.ingest",
                in_flight = self.tracker.len(),
                grace_ms = grace.as_millis() as u64,
                "shutdown_grace_elapsed"
            );
        }
        if let Err(err) = self.transport.disconnect().await {
            warn!(target: "mbridge.ingest", error = %err, "mqtt_disconnect_failed");
        }
        self.set_state(SessionState::Disconnected);
        info!(target: "mbridge.ingest", "mqtt_disconnected");
    }

    async fn wait_connected(&mut self) -> Result<(), TransportError> {
        loop {
            if let TransportEvent::Connected { .. } = self.transport.poll().await? {
                return Ok(());
            }
        }
    }

    async fn resubscribe(&mut self) {
        self.set_state(SessionState::Subscribing);
        let mut failed = 0usize;
        for (filter, qos) in self.router.subscriptions() {
            match self.transport.subscribe(&filter, qos).await {
                Ok(()) => info!(target: "mbridge.ingest", filter = %filter, qos = ?qos, "subscribed"),
                Err(err) => {
                    failed += 1;
                    warn!(target: "mbridge.ingest", filter = %filter, error = %err, "subscribe_failed");
                }
            }
        }
        if failed == 0 {
            self.set_state(SessionState::Active);
        } else {
            self.set_state(SessionState::Degraded);
        }
    }

    fn dispatch(&self, event: RawEvent) {
        let router = self.router.clone();
        let span = message_span(&new_message_id(), &event.topic);
        self.tracker.spawn(
            async move {
                if let Err(err) = router.dispatch(event).await {
                    debug!(target: "mbridge.ingest", error = %err, "message_dropped");
                }
            }
            .instrument(span),
        );
    }

    fn set_state(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(target: "mbridge.ingest", from = ?previous, to = ?next, "session_state_changed");
        }
    }
}
