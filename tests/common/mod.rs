//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use campaignkit::{
    CampaignKit, CampaignKitError, CampaignKitOptions, Configuration, ErrorCode, KeyValueStore,
    MemoryStore, PendingEvent, Result, Session, Transport,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-process backend with switchable connectivity.
pub struct MockTransport {
    pub auth_ok: AtomicBool,
    pub auth_delay: Mutex<Duration>,
    pub online: AtomicBool,
    pub send_delay: Mutex<Duration>,
    pub failing_types: Mutex<HashSet<String>>,
    pub delivered: Mutex<Vec<PendingEvent>>,
    pub feed: Mutex<serde_json::Value>,
    pub feed_delay: Mutex<Duration>,
    pub auth_calls: AtomicUsize,
    pub send_attempts: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            auth_ok: AtomicBool::new(true),
            auth_delay: Mutex::new(Duration::ZERO),
            online: AtomicBool::new(true),
            send_delay: Mutex::new(Duration::ZERO),
            failing_types: Mutex::new(HashSet::new()),
            delivered: Mutex::new(Vec::new()),
            feed: Mutex::new(serde_json::json!([])),
            feed_delay: Mutex::new(Duration::ZERO),
            auth_calls: AtomicUsize::new(0),
            send_attempts: AtomicUsize::new(0),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn fail_type(&self, event_type: &str) {
        self.failing_types.lock().insert(event_type.to_string());
    }

    pub fn delivered_types(&self) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn authenticate(&self, config: &Configuration) -> Result<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.auth_delay.lock();
        tokio::time::sleep(delay).await;

        if self.auth_ok.load(Ordering::SeqCst) {
            Ok(Session::new(config, "test-token"))
        } else {
            Err(CampaignKitError::new(ErrorCode::HttpUnauthorized, "Unauthorized: 401"))
        }
    }

    async fn send_event(&self, _session: &Session, event: &PendingEvent) -> Result<()> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.send_delay.lock();
        tokio::time::sleep(delay).await;

        if !self.online.load(Ordering::SeqCst) {
            return Err(CampaignKitError::new(ErrorCode::NetworkError, "offline"));
        }
        if self.failing_types.lock().contains(&event.event_type) {
            return Err(CampaignKitError::new(ErrorCode::HttpServerError, "Server Error: 500"));
        }

        self.delivered.lock().push(event.clone());
        Ok(())
    }

    async fn fetch_campaign_feed(&self, _session: &Session, _screen: &str) -> Result<serde_json::Value> {
        let delay = *self.feed_delay.lock();
        tokio::time::sleep(delay).await;

        if !self.online.load(Ordering::SeqCst) {
            return Err(CampaignKitError::new(ErrorCode::NetworkError, "offline"));
        }
        Ok(self.feed.lock().clone())
    }
}

pub fn test_options() -> CampaignKitOptions {
    CampaignKitOptions::builder()
        .ready_timeout(Duration::from_millis(300))
        .ready_poll_interval(Duration::from_millis(10))
        .init_timeout(Duration::from_secs(1))
        .build()
}

pub fn test_config() -> Configuration {
    Configuration::new("acc_1", "app_1", "user_1", "https://backend.example.com")
}

pub fn sdk_with(transport: &Arc<MockTransport>, backend: Arc<dyn KeyValueStore>) -> CampaignKit {
    CampaignKit::with_parts(test_options(), transport.clone(), backend).unwrap()
}

pub fn sdk(transport: &Arc<MockTransport>) -> CampaignKit {
    sdk_with(transport, Arc::new(MemoryStore::new()))
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
