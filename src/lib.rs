//! CampaignKit Rust SDK core
//!
//! Fetches in-app marketing campaigns, decodes them into a typed model for
//! the view layer, and reports engagement events with at-least-once
//! delivery through a durable local queue.
//!
//! # Quick Start
//!
//! ```no_run
//! use campaignkit::{CampaignKit, CampaignKitOptions, CampaignType, Configuration};
//!
//! #[tokio::main]
//! async fn main() -> campaignkit::Result<()> {
//!     let sdk = CampaignKit::new(CampaignKitOptions::default())?;
//!
//!     sdk.configure(Configuration::new(
//!         "account-id",
//!         "app-id",
//!         "user-123",
//!         "https://backend.example.com/api/v1",
//!     ));
//!
//!     // Fetch campaigns for a screen; the registry keeps the latest set
//!     sdk.fetch_campaigns("home").await;
//!     if let Some(banner) = sdk.registry().first_of(CampaignType::Banner, None) {
//!         sdk.track("viewed", Some(banner.id.as_str()), None);
//!     }
//!
//!     // Retry anything queued while offline
//!     sdk.flush_pending().await;
//!
//!     Ok(())
//! }
//! ```

pub mod campaign;
pub mod core;
pub mod error;
pub mod http;
pub mod store;
mod client;

pub use campaign::{Campaign, CampaignDetails, CampaignRegistry, CampaignType};

pub use error::{CampaignKitError, ErrorCode, Result};

pub use self::core::{
    CampaignKitOptions, CampaignKitOptionsBuilder, Configuration, ConfigurationGate,
    EventTracker, FlushReport, GateState, RetryFlusher, TrackOutcome,
};

pub use http::{HttpTransport, Session, Transport};

pub use store::{FileStore, KeyValueStore, MemoryStore, PendingEvent, PendingEventStore};

pub use client::{CampaignKit, SDK_VERSION};
