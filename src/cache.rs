use std::collections::HashMap;

use crate::model::{CacheEntry, Item, ResultPage, SearchKey};

/// Accumulated hits per search key.
///
/// Entries are created on first merge and never evicted, so memory grows
/// with the number of distinct keys searched in a run.
#[derive(Debug, Default)]
pub struct ResultsCache {
    entries: HashMap<SearchKey, CacheEntry>,
}

impl ResultsCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// True iff nothing has been merged under `key` yet. More pages being
    /// available upstream does not count.
    pub fn needs_fetch(&self, key: &str) -> bool {
        !self.entries.contains_key(key)
    }

    /// Appends `page.hits` to the entry for `key` and records `page.page` as
    /// the entry's page. The page number is replaced, not maxed, so an
    /// older page landing late moves the counter backwards.
    pub fn merge(&mut self, key: &str, page: ResultPage) -> &CacheEntry {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.hits.extend(page.hits);
        entry.page = page.page;
        entry
    }

    /// Drops every hit with identifier `id`. Returns `None` if `key` has no
    /// entry; an id that matches nothing leaves the entry untouched.
    pub fn dismiss(&mut self, key: &str, id: &str) -> Option<&CacheEntry> {
        let entry = self.entries.get_mut(key)?;
        entry.hits.retain(|item| item.id != id);
        Some(entry)
    }

    pub fn view(&self, key: &str) -> (&[Item], u32) {
        match self.entries.get(key) {
            Some(entry) => (entry.hits.as_slice(), entry.page),
            None => (&[][..], 0),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
