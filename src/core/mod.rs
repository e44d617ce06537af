mod config;
mod flusher;
mod gate;
mod tracker;

pub(crate) use config::join_endpoint;
pub use config::{
    CampaignKitOptions, CampaignKitOptionsBuilder, Configuration, DEFAULT_READY_POLL_INTERVAL,
    DEFAULT_READY_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use flusher::{FlushReport, RetryFlusher};
pub use gate::{ConfigurationGate, GateState};
pub use tracker::{EventTracker, TrackOutcome};
