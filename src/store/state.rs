use std::cmp::Reverse;

use crate::job::Job;
use crate::store::gate::LoadGate;

/// Observable store state plus the skeleton gate.
///
/// All mutation goes through methods driven by the store event loop; readers
/// see it behind the store's `RwLock`. `jobs` holds the collection in remote
/// arrival order and is replaced wholesale on every snapshot, so jobs that
/// only exist client-side never occur.
#[derive(Debug)]
pub struct StoreState {
    /// Current collection, remote arrival order
    pub jobs: Vec<Job>,
    /// Latched true by the first applied snapshot; never reset
    pub jobs_data_loaded_in_session: bool,
    /// True exactly while the UI should show a loading skeleton
    pub is_currently_fetching: bool,
    /// Last subscription error, if any
    pub error: Option<String>,

    gate: LoadGate,
}

impl StoreState {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            jobs_data_loaded_in_session: false,
            is_currently_fetching: false,
            error: None,
            gate: LoadGate::Open,
        }
    }

    /// Start a fresh attach cycle: show the skeleton, clear any stale error,
    /// re-arm the rendezvous gate.
    pub fn begin_attach(&mut self) {
        self.is_currently_fetching = true;
        self.error = None;
        self.gate = LoadGate::WaitingBoth;
    }

    /// The minimum-skeleton timer for the current attach cycle elapsed.
    pub fn timer_fired(&mut self) {
        if self.gate.on_timer_fired() {
            self.is_currently_fetching = false;
        }
    }

    /// Apply an inbound snapshot: wholesale replacement, no diffing.
    pub fn apply_snapshot(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs;
        self.jobs_data_loaded_in_session = true;
        if self.gate.on_snapshot() {
            self.is_currently_fetching = false;
        }
    }

    /// Record a subscription failure. The skeleton is forcibly cleared so
    /// the UI never hangs in loading state.
    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.is_currently_fetching = false;
    }

    /// The listener was detached. Jobs and the session latch are retained;
    /// a detach mid-attach must not strand the skeleton.
    pub fn detach(&mut self) {
        self.is_currently_fetching = false;
    }

    /// Derived view: jobs ordered by `updated_at` descending. Missing
    /// timestamps sort last; the sort is stable, so ties keep input order.
    pub fn sorted_jobs(&self) -> Vec<Job> {
        let mut sorted = self.jobs.clone();
        sorted.sort_by_key(|job| Reverse(job.sort_timestamp()));
        sorted
    }
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}
