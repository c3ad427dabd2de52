use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fetcher::FetchError;
use crate::model::SearchKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No fetch issued yet.
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Events that move the status. Text edits and dismissals never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    FetchIssued,
    CacheHit,
    FetchSucceeded,
    FetchFailed,
}

impl Status {
    pub fn next(self, transition: Transition) -> Status {
        match transition {
            Transition::FetchIssued => Status::Loading,
            Transition::CacheHit | Transition::FetchSucceeded => Status::Ready,
            Transition::FetchFailed => Status::Failed,
        }
    }
}

/// Owner side of a session's validity flag. Invalidated on teardown or drop.
#[derive(Debug)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            alive: Arc::clone(&self.alive),
        }
    }

    pub fn invalidate(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// True if `token` was handed out by this owner and the owner is still
    /// alive.
    pub fn accepts(&self, token: &LivenessToken) -> bool {
        Arc::ptr_eq(&self.alive, &token.alive) && self.is_alive()
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.invalidate();
    }
}

/// Travels with an outstanding fetch.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Arc<AtomicBool>,
}

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Per-session search state. `active_key` is `None` until the first submit.
#[derive(Debug, Default)]
pub struct SearchSession {
    search_term: String,
    active_key: Option<SearchKey>,
    status: Status,
    error: Option<FetchError>,
    liveness: Liveness,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn token(&self) -> LivenessToken {
        self.liveness.token()
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn accepts(&self, token: &LivenessToken) -> bool {
        self.liveness.accepts(token)
    }

    pub fn teardown(&mut self) {
        self.liveness.invalidate();
    }

    pub(crate) fn set_search_term(&mut self, text: String) {
        self.search_term = text;
    }

    /// Commits the current search term as the active key.
    pub(crate) fn commit(&mut self) -> &str {
        self.active_key.insert(self.search_term.clone())
    }

    pub(crate) fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::FetchIssued | Transition::FetchSucceeded => self.error = None,
            Transition::CacheHit | Transition::FetchFailed => {}
        }
        self.status = self.status.next(transition);
    }

    pub(crate) fn fail(&mut self, error: FetchError) {
        self.apply(Transition::FetchFailed);
        self.error = Some(error);
    }
}
