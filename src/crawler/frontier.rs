//! URL frontier
//!
//! The frontier is the deduplicating work queue shared by all workers of a
//! crawl run. It owns three pieces of state behind one lock:
//!
//! - the FIFO queue of `(url, depth)` entries waiting to be fetched
//! - the discovered set (every URL ever admitted)
//! - the visited set (every URL a worker has claimed for fetching)
//!
//! It also tracks how many workers currently hold an entry. [`Frontier::take`]
//! only reports "done" when the queue is empty *and* that count is zero, so a
//! worker can never exit while another one is about to admit more links.

use crate::url::{is_same_origin, normalize_url, parse_absolute};
use crate::CrawlError;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use url::{Origin, Url};

/// A URL waiting to be fetched, with its hop count from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

/// Outcome of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the queue and recorded as discovered
    Admitted,
    /// Depth exceeds the configured maximum
    TooDeep,
    /// Origin differs from the discovering page's origin
    CrossOrigin,
    /// Already discovered earlier in this run
    Duplicate,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    discovered: HashSet<String>,
    visited: HashSet<String>,
    active: usize,
}

/// Deduplicating, depth- and origin-bounded work queue
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    state: Mutex<FrontierState>,
    changed: Notify,
}

/// An entry handed to a worker by [`Frontier::take`]
///
/// While the lease is alive the worker counts as active. Dropping it marks
/// the worker idle again and wakes any worker blocked in `take`.
#[derive(Debug)]
pub struct FrontierLease<'a> {
    frontier: &'a Frontier,
    entry: FrontierEntry,
}

impl FrontierLease<'_> {
    pub fn entry(&self) -> &FrontierEntry {
        &self.entry
    }
}

impl Drop for FrontierLease<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

impl Frontier {
    /// Creates an empty frontier that rejects entries deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
        }
    }

    /// Validates `url` and admits it at depth 0
    ///
    /// # Returns
    ///
    /// * `Ok(Url)` - The normalized seed URL
    /// * `Err(CrawlError::InvalidSeedUrl)` - The URL is not absolute HTTP(S)
    pub fn seed(&self, url: &str) -> Result<Url, CrawlError> {
        let seed = parse_absolute(url).map_err(|source| CrawlError::InvalidSeedUrl {
            url: url.to_string(),
            source,
        })?;

        let origin = seed.origin();
        self.admit(seed.clone(), 0, &origin);
        Ok(seed)
    }

    /// Offers a discovered URL to the queue
    ///
    /// `origin` is the origin of the page on which the link was found.
    /// Rejections are silent; the returned [`Admission`] only says why.
    pub fn admit(&self, url: Url, depth: u32, origin: &Origin) -> Admission {
        if depth > self.max_depth {
            return Admission::TooDeep;
        }

        if !is_same_origin(&url, origin) {
            return Admission::CrossOrigin;
        }

        let url = normalize_url(url);
        {
            let mut state = self.lock();
            if !state.discovered.insert(url.as_str().to_string()) {
                return Admission::Duplicate;
            }
            state.queue.push_back(FrontierEntry { url, depth });
        }

        self.changed.notify_waiters();
        Admission::Admitted
    }

    /// Waits for the next entry
    ///
    /// Returns `None` once the queue is empty and no lease is outstanding.
    /// While the queue is empty but another worker still holds a lease, this
    /// blocks until that worker either admits new links or goes idle.
    pub async fn take(&self) -> Option<FrontierLease<'_>> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a wakeup between the check
            // and the await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(entry) = state.queue.pop_front() {
                    state.active += 1;
                    return Some(FrontierLease {
                        frontier: self,
                        entry,
                    });
                }

                if state.active == 0 {
                    drop(state);
                    self.changed.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Claims `url` for fetching
    ///
    /// Returns true exactly once per URL per run; every later call for the
    /// same URL returns false.
    pub fn claim(&self, url: &Url) -> bool {
        self.lock().visited.insert(url.as_str().to_string())
    }

    fn release(&self) {
        {
            let mut state = self.lock();
            state.active = state.active.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }

    /// Number of entries waiting in the queue
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Number of workers currently holding a lease
    pub fn active_workers(&self) -> usize {
        self.lock().active
    }

    pub fn discovered_count(&self) -> usize {
        self.lock().discovered.len()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Visited URLs, sorted
    pub fn visited_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.lock().visited.iter().cloned().collect();
        urls.sort();
        urls
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
