use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Ceiling on the pause applied before contacting a slow host
pub const MAX_SLOW_HOST_DELAY: Duration = Duration::from_secs(10);

/// Pacing state for a single host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostState {
    /// Whether the host has answered slower than the slow-host threshold.
    /// Never reverts within a run.
    pub slow: bool,

    /// Pause applied before each request to this host while it is slow
    pub delay: Duration,
}

impl HostState {
    /// Creates a HostState for a host that has not been marked slow
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a measured response time
    ///
    /// If `elapsed` meets or exceeds `threshold` the host becomes slow and its
    /// delay is replaced by `elapsed`, capped at [`MAX_SLOW_HOST_DELAY`].
    /// Faster responses leave the state untouched.
    ///
    /// Returns true if this call marked the host slow.
    pub fn observe(&mut self, elapsed: Duration, threshold: Duration) -> bool {
        if elapsed < threshold {
            return false;
        }

        self.slow = true;
        self.delay = elapsed.min(MAX_SLOW_HOST_DELAY);
        true
    }

    /// Delay to apply before the next request, if any
    pub fn pending_delay(&self) -> Option<Duration> {
        if self.slow {
            Some(self.delay)
        } else {
            None
        }
    }
}

/// Per-host slow tracking shared by all workers of one crawl run
///
/// The lock is only ever held for a map lookup or insert, never across an
/// await point.
#[derive(Debug, Default)]
pub struct HostTracker {
    hosts: Mutex<HashMap<String, HostState>>,
}

impl HostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delay to honor before contacting `host`, if it is slow
    pub fn delay_for(&self, host: &str) -> Option<Duration> {
        self.lock().get(host).and_then(HostState::pending_delay)
    }

    /// Feeds a successful response time for `host` into its state
    ///
    /// Concurrent observations are last-write-wins; each one is capped.
    pub fn record_response(&self, host: &str, elapsed: Duration, threshold: Duration) -> bool {
        let mut hosts = self.lock();
        let state = hosts.entry(host.to_string()).or_insert_with(HostState::new);
        state.observe(elapsed, threshold)
    }

    /// Whether `host` has been marked slow
    pub fn is_slow(&self, host: &str) -> bool {
        self.lock().get(host).map_or(false, |s| s.slow)
    }

    /// Returns a copy of the state for `host`
    pub fn get(&self, host: &str) -> Option<HostState> {
        self.lock().get(host).copied()
    }

    /// Hosts currently marked slow, sorted by name
    pub fn slow_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, state)| state.slow)
            .map(|(host, _)| host.clone())
            .collect();
        hosts.sort();
        hosts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, HostState>> {
        // A poisoned map still holds consistent entries; every write is a
        // single insert or field assignment.
        self.hosts.lock().unwrap_or_else(|e| e.into_inner())
    }
}
