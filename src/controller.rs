use tracing::{debug, info, warn};

use crate::cache::ResultsCache;
use crate::fetcher::FetchError;
use crate::model::{Item, ResultPage, SearchKey};
use crate::session::{LivenessToken, SearchSession, Status, Transition};

/// A fetch the host should run. Hand the outcome back through
/// [`SearchController::complete`] together with `token`.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub key: SearchKey,
    pub page: u32,
    pub hits_per_page: u32,
    pub token: LivenessToken,
}

/// Result of running a [`FetchRequest`].
#[derive(Debug)]
pub struct Completion {
    pub token: LivenessToken,
    pub key: SearchKey,
    pub page: u32,
    pub outcome: Result<ResultPage, FetchError>,
}

#[derive(Debug)]
pub enum Event {
    TextChanged(String),
    Submit,
    LoadMore,
    Completed(Completion),
    Dismiss(String),
}

/// What the renderer reads after every transition.
#[derive(Debug, Clone, Copy)]
pub struct SearchView<'a> {
    pub search_term: &'a str,
    pub active_key: Option<&'a str>,
    pub hits: &'a [Item],
    pub page: u32,
    pub status: Status,
    pub is_loading: bool,
    pub error: Option<&'a FetchError>,
}

pub struct SearchController {
    session: SearchSession,
    cache: ResultsCache,
    hits_per_page: u32,
}

impl SearchController {
    pub fn new(hits_per_page: u32) -> Self {
        Self {
            session: SearchSession::new(),
            cache: ResultsCache::new(),
            hits_per_page,
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn cache(&self) -> &ResultsCache {
        &self.cache
    }

    /// Dispatches `event`; returns the fetch to run, if any.
    pub fn handle(&mut self, event: Event) -> Option<FetchRequest> {
        match event {
            Event::TextChanged(text) => {
                self.on_text_change(text);
                None
            }
            Event::Submit => self.on_submit(),
            Event::LoadMore => self.on_load_more(),
            Event::Completed(completion) => {
                self.complete(completion);
                None
            }
            Event::Dismiss(id) => {
                self.on_dismiss(&id);
                None
            }
        }
    }

    pub fn on_text_change(&mut self, text: impl Into<String>) {
        self.session.set_search_term(text.into());
    }

    pub fn on_submit(&mut self) -> Option<FetchRequest> {
        let key = self.session.commit().to_string();
        if self.cache.needs_fetch(&key) {
            self.issue(key, 0)
        } else {
            debug!(key = %key, "Serving search from cache");
            self.session.apply(Transition::CacheHit);
            None
        }
    }

    /// Always fetches the next page, cached or not. Ignored before the first
    /// submit.
    pub fn on_load_more(&mut self) -> Option<FetchRequest> {
        let key = self.session.active_key()?.to_string();
        let Some(next) = self.cache.view(&key).1.checked_add(1) else {
            warn!(key = %key, "Already at the last representable page; not fetching more");
            return None;
        };
        self.issue(key, next)
    }

    /// Applies a completion if its token is still accepted by this session.
    /// Returns whether anything changed.
    pub fn complete(&mut self, completion: Completion) -> bool {
        let Completion {
            token,
            key,
            page,
            outcome,
        } = completion;
        let applied = match outcome {
            Ok(result) => self.on_fetch_success(&token, result),
            Err(err) => self.on_fetch_failure(&token, err),
        };
        if !applied {
            debug!(key = %key, page, "Dropped completion for a torn-down session");
        }
        applied
    }

    /// Merges under the key active *now*, which may differ from the key the
    /// fetch was issued for if the user resubmitted in between.
    pub fn on_fetch_success(&mut self, token: &LivenessToken, page: ResultPage) -> bool {
        if !self.session.accepts(token) {
            return false;
        }
        let key = self.session.active_key().unwrap_or_default().to_string();
        let received = page.hits.len();
        let entry = self.cache.merge(&key, page);
        info!(
            key = %key,
            page = entry.page,
            received,
            total = entry.hits.len(),
            "Merged result page"
        );
        self.session.apply(Transition::FetchSucceeded);
        true
    }

    pub fn on_fetch_failure(&mut self, token: &LivenessToken, err: FetchError) -> bool {
        if !self.session.accepts(token) {
            return false;
        }
        warn!(key = ?self.session.active_key(), error = %err, "Search fetch failed");
        self.session.fail(err);
        true
    }

    pub fn on_dismiss(&mut self, id: &str) {
        let Some(key) = self.session.active_key() else {
            return;
        };
        if let Some(entry) = self.cache.dismiss(key, id) {
            debug!(key = %key, id, remaining = entry.hits.len(), "Dismissed item");
        }
    }

    /// Invalidates every outstanding fetch. Further submits are ignored.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }

    /// Replaces the session with a fresh one, keeping the cache. Fetches
    /// issued by the old session are dropped when they complete.
    pub fn restart_session(&mut self) {
        self.session = SearchSession::new();
    }

    pub fn view(&self) -> SearchView<'_> {
        let (hits, page) = match self.session.active_key() {
            Some(key) => self.cache.view(key),
            None => (&[][..], 0),
        };
        SearchView {
            search_term: self.session.search_term(),
            active_key: self.session.active_key(),
            hits,
            page,
            status: self.session.status(),
            is_loading: self.session.is_loading(),
            error: self.session.error(),
        }
    }

    fn issue(&mut self, key: SearchKey, page: u32) -> Option<FetchRequest> {
        if !self.session.is_alive() {
            warn!(key = %key, "Session torn down; not issuing fetch");
            return None;
        }
        self.session.apply(Transition::FetchIssued);
        debug!(key = %key, page, "Issuing fetch");
        Some(FetchRequest {
            key,
            page,
            hits_per_page: self.hits_per_page,
            token: self.session.token(),
        })
    }
}
