//! CampaignKit Rust SDK Lab
//!
//! Internal verification script for the offline -> online event cycle.
//! Runs against an in-process backend; no network access needed.
//! Run with: cargo run --example sdk-lab
//! Set RUST_LOG=campaignkit=debug to see the SDK's own logging.

use async_trait::async_trait;
use campaignkit::{
    CampaignKit, CampaignKitError, CampaignKitOptions, CampaignType, Configuration, ErrorCode,
    GateState, MemoryStore, PendingEvent, Result, Session, TrackOutcome, Transport,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const PASS: &str = "\x1b[32m[PASS]\x1b[0m";
const FAIL: &str = "\x1b[31m[FAIL]\x1b[0m";

/// Backend stand-in with a connectivity switch.
#[derive(Default)]
struct LabBackend {
    offline: AtomicBool,
    received: AtomicUsize,
}

#[async_trait]
impl Transport for LabBackend {
    async fn authenticate(&self, config: &Configuration) -> Result<Session> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Session::new(config, "lab-token"))
    }

    async fn send_event(&self, _session: &Session, _event: &PendingEvent) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CampaignKitError::new(ErrorCode::HttpNetworkError, "Connection failed"));
        }
        self.received.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_campaign_feed(&self, _session: &Session, screen: &str) -> Result<serde_json::Value> {
        Ok(serde_json::json!([
            {"id": "lab-banner", "campaign_type": "BAN", "screen": screen,
             "details": [{"image": "https://cdn.example.com/lab.png"}]},
            {"id": "lab-widget", "campaign_type": "WID", "position": "top",
             "details": {"type": "carousel", "widget_images": []}},
            {"id": "lab-broken", "campaign_type": "BAN", "details": []}
        ]))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== CampaignKit Rust SDK Lab ===\n");

    let mut passed = 0;
    let mut failed = 0;

    macro_rules! pass {
        ($test:expr) => {{
            println!("{} {}", PASS, $test);
            passed += 1;
        }};
    }

    macro_rules! fail {
        ($test:expr) => {{
            println!("{} {}", FAIL, $test);
            failed += 1;
        }};
    }

    let backend = Arc::new(LabBackend::default());
    let options = CampaignKitOptions::builder()
        .ready_timeout(Duration::from_secs(1))
        .ready_poll_interval(Duration::from_millis(20))
        .build();

    let sdk = match CampaignKit::with_parts(options, backend.clone(), Arc::new(MemoryStore::new())) {
        Ok(sdk) => sdk,
        Err(e) => {
            fail!(format!("Construction - {}", e));
            print_summary(passed, failed);
            std::process::exit(1);
        }
    };

    // Test 1: Events before configuration are dropped
    println!("Testing configuration gate...");
    let early = sdk.track_and_wait(PendingEvent::new("too_early")).await;
    if early == TrackOutcome::Dropped && sdk.pending_events().is_empty() {
        pass!("Pre-configuration event dropped");
    } else {
        fail!(format!("Pre-configuration event - got {:?}", early));
    }

    // Test 2: Initialization
    let config = Configuration::new("lab-account", "lab-app", "lab-user", "https://lab.invalid");
    sdk.configure(config.clone());
    match sdk.wait_for_ready(Duration::from_secs(2)).await {
        GateState::Ready => pass!("Initialization"),
        state => fail!(format!("Initialization - ended in {:?}", state)),
    }

    // Test 3: First configuration wins
    let mut other = config.clone();
    other.user_id = "someone-else".to_string();
    if !sdk.configure(other) && sdk.configuration().map(|c| c.user_id) == Some("lab-user".into()) {
        pass!("Second configure() ignored");
    } else {
        fail!("Second configure() - configuration was replaced");
    }

    // Test 4: Offline tracking queues events
    println!("\nTesting offline queue...");
    backend.offline.store(true, Ordering::SeqCst);
    let mut queued = 0;
    for event_type in ["viewed", "clicked", "dismissed"] {
        let event = PendingEvent::new(event_type)
            .campaign_id("lab-banner")
            .with_metadata("source", "sdk-lab");
        if sdk.track_and_wait(event).await == TrackOutcome::Queued {
            queued += 1;
        }
    }
    if queued == 3 && sdk.pending_events().len() == 3 {
        pass!("Offline events queued");
    } else {
        fail!(format!("Offline events - {} queued", queued));
    }

    // Test 5: Flush after reconnect
    backend.offline.store(false, Ordering::SeqCst);
    let report = sdk.flush_pending().await;
    if report.delivered == 3 && sdk.pending_events().is_empty() {
        pass!("flush_pending() after reconnect");
    } else {
        fail!(format!("flush_pending() - {:?}", report));
    }

    // Test 6: Live delivery
    match sdk.track_and_wait(PendingEvent::new("converted")).await {
        TrackOutcome::Delivered => pass!("Live delivery"),
        outcome => fail!(format!("Live delivery - got {:?}", outcome)),
    }

    // Test 7: Campaign decoding
    println!("\nTesting campaigns...");
    let campaigns = sdk.fetch_campaigns("home").await;
    if campaigns.len() == 2 {
        pass!("fetch_campaigns() dropped the undecodable entry");
    } else {
        fail!(format!("fetch_campaigns() - {} campaigns", campaigns.len()));
    }

    if sdk
        .registry()
        .first_of(CampaignType::Widget, Some("top"))
        .is_some()
    {
        pass!("Registry lookup by type and position");
    } else {
        fail!("Registry lookup - widget not found");
    }

    // Test 8: Reset
    sdk.reset();
    if sdk.state() == GateState::Unconfigured && sdk.registry().is_empty() {
        pass!("reset()");
    } else {
        fail!("reset() - state not cleared");
    }

    println!(
        "\nBackend received {} events",
        backend.received.load(Ordering::SeqCst)
    );

    print_summary(passed, failed);

    if failed > 0 {
        println!("\n\x1b[31mSome verifications failed!\x1b[0m");
        std::process::exit(1);
    } else {
        println!("\n\x1b[32mAll verifications passed!\x1b[0m");
        std::process::exit(0);
    }
}

fn print_summary(passed: i32, failed: i32) {
    println!("\n{}", "=".repeat(40));
    println!("Results: {} passed, {} failed", passed, failed);
    println!("{}", "=".repeat(40));
}
