//! State module for per-host pacing
//!
//! # Components
//!
//! - `HostState`: whether a host is slow and the delay to apply before contacting it
//! - `HostTracker`: the shared map of host states for one crawl run

mod host_state;

pub use host_state::{HostState, HostTracker, MAX_SLOW_HOST_DELAY};
