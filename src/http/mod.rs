mod client;
mod transport;

pub use client::{HttpTransport, AUTH_PATH, CAMPAIGNS_PATH, TRACK_EVENT_PATH};
pub use transport::{Session, Transport};
