//! 订阅路由：topic 过滤器 → 消息处理器。

use crate::{IngestError, MessageHandler};
use domain::{RawEvent, filter_matches, validate_filter};
use rumqttc::QoS;
use std::sync::Arc;
use tracing::warn;

/// 一条订阅路由。
#[derive(Clone)]
pub struct Route {
    filter: String,
    qos: QoS,
    handler: Arc<dyn MessageHandler>,
}

/// 路由表，构建后只读。按注册顺序取第一个匹配的路由。
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一条路由；过滤器非法时返回错误。
    pub fn route(
        mut self,
        filter: impl Into<String>,
        qos: QoS,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, IngestError> {
        let filter = filter.into();
        validate_filter(&filter).map_err(IngestError::InvalidFilter)?;
        self.routes.push(Route {
            filter,
            qos,
            handler,
        });
        Ok(self)
    }

    /// 需要向 broker 订阅的 (过滤器, QoS) 列表。
    pub fn subscriptions(&self) -> Vec<(String, QoS)> {
        self.routes
            .iter()
            .map(|route| (route.filter.clone(), route.qos))
            .collect()
    }

    /// 将消息交给匹配的处理器。
    pub async fn dispatch(&self, event: RawEvent) -> Result<(), IngestError> {
        let Some(route) = self
            .routes
            .iter()
            .find(|route| filter_matches(&route.filter, &event.topic))
        else {
            warn!(target: "mbridge.ingest", topic = %event.topic, "message_unrouted");
            return Err(IngestError::NoRoute(event.topic));
        };
        route.handler.handle(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, String)>>>,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, event: RawEvent) -> Result<(), IngestError> {
            self.seen
                .lock()
                .expect("lock")
                .push((self.name, event.topic));
            Ok(())
        }
    }

    fn recorder(name: &'static str, seen: &Arc<Mutex<Vec<(&'static str, String)>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            seen: seen.clone(),
        })
    }

    #[tokio::test]
    async fn dispatch_picks_first_matching_route() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("machine/+/realtime", QoS::AtLeastOnce, recorder("realtime", &seen))
            .expect("route")
            .route("machine/#", QoS::AtMostOnce, recorder("fallback", &seen))
            .expect("route");

        router
            .dispatch(RawEvent::received_now("machine/7/realtime", b"{}".to_vec()))
            .await
            .expect("dispatch");
        router
            .dispatch(RawEvent::received_now("machine/7/status", b"{}".to_vec()))
            .await
            .expect("dispatch");

        let seen = seen.lock().expect("lock").clone();
        assert_eq!(
            seen,
            vec![
                ("realtime", "machine/7/realtime".to_string()),
                ("fallback", "machine/7/status".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn dispatch_without_match_is_no_route() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("machine/+/realtime", QoS::AtLeastOnce, recorder("realtime", &seen))
            .expect("route");

        let err = router
            .dispatch(RawEvent::received_now("plant/1/realtime", b"{}".to_vec()))
            .await
            .expect_err("no route");
        assert!(matches!(err, IngestError::NoRoute(topic) if topic == "plant/1/realtime"));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn route_rejects_invalid_filter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let result = Router::new().route("machine/#/realtime", QoS::AtLeastOnce, recorder("x", &seen));
        assert!(matches!(result, Err(IngestError::InvalidFilter(_))));
    }

    #[test]
    fn subscriptions_follow_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("machine/+/realtime", QoS::AtLeastOnce, recorder("a", &seen))
            .expect("route")
            .route("machine/+/alarm", QoS::ExactlyOnce, recorder("b", &seen))
            .expect("route");
        assert_eq!(
            router.subscriptions(),
            vec![
                ("machine/+/realtime".to_string(), QoS::AtLeastOnce),
                ("machine/+/alarm".to_string(), QoS::ExactlyOnce),
            ]
        );
    }
}
