//! URL frontier
//!
//! Every URL known to a run has exactly one record here, keyed by its
//! normalized form. Records are handed out in insertion order and their state
//! only moves forward.

use crate::state::UrlState;
use crate::url::{normalize_url, CrawlProfile};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use url::Url;

/// Stable identifier of a frontier record, used as the dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UrlId(usize);

impl fmt::Display for UrlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A URL known to the crawl
#[derive(Debug, Clone)]
pub struct CrawlUrl {
    pub id: UrlId,

    /// Normalized URL
    pub url: Url,

    /// Page the URL was first discovered on, `None` for the seed
    pub found_on: Option<Url>,

    pub state: UrlState,

    /// Why the URL was processed without being fetched
    pub reason: Option<String>,
}

/// The set of known URLs and their processing state
#[derive(Debug)]
pub struct CrawlFrontier {
    records: Vec<CrawlUrl>,
    index: HashMap<String, UrlId>,
    pending: BTreeSet<UrlId>,
    profile: CrawlProfile,
}

impl CrawlFrontier {
    pub fn new(profile: CrawlProfile) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            pending: BTreeSet::new(),
            profile,
        }
    }

    /// Adds a URL as pending
    ///
    /// Returns false, leaving the frontier untouched, when the URL is already
    /// known or falls outside the crawl profile.
    pub fn add(&mut self, url: Url, found_on: Option<Url>) -> bool {
        let url = normalize_url(&url);
        if !self.profile.should_crawl(&url) || self.index.contains_key(url.as_str()) {
            return false;
        }

        let id = self.insert(url, found_on, UrlState::Pending, None);
        self.pending.insert(id);
        true
    }

    /// Records a URL that will never be fetched
    ///
    /// The record is created directly in the processed state. Returns false
    /// when the URL is already known or out of scope.
    pub fn record_skipped(&mut self, url: Url, found_on: Option<Url>, reason: &str) -> bool {
        let url = normalize_url(&url);
        if !self.profile.should_crawl(&url) || self.index.contains_key(url.as_str()) {
            return false;
        }

        self.insert(url, found_on, UrlState::Processed, Some(reason.to_string()));
        true
    }

    pub fn has_pending_urls(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Oldest pending record, without changing its state
    pub fn next_pending(&self) -> Option<&CrawlUrl> {
        self.pending.iter().next().map(|id| &self.records[id.0])
    }

    /// Moves a pending record to processing
    pub fn mark_processing(&mut self, id: UrlId) -> bool {
        self.advance(id, UrlState::Processing, None)
    }

    /// Moves a record to processed, optionally recording why it was skipped
    ///
    /// Returns false if the record is unknown or already processed.
    pub fn mark_processed(&mut self, id: UrlId, reason: Option<&str>) -> bool {
        self.advance(id, UrlState::Processed, reason)
    }

    /// Returns true if the normalized form of `url` is known
    pub fn contains(&self, url: &Url) -> bool {
        self.index.contains_key(normalize_url(url).as_str())
    }

    pub fn get(&self, id: UrlId) -> Option<&CrawlUrl> {
        self.records.get(id.0)
    }

    /// Looks a record up by URL
    pub fn find(&self, url: &Url) -> Option<&CrawlUrl> {
        self.index
            .get(normalize_url(url).as_str())
            .map(|id| &self.records[id.0])
    }

    pub fn profile(&self) -> &CrawlProfile {
        &self.profile
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records currently in `state`
    pub fn count_in(&self, state: UrlState) -> usize {
        match state {
            UrlState::Pending => self.pending.len(),
            _ => self.records.iter().filter(|r| r.state == state).count(),
        }
    }

    /// Number of records processed with a skip reason
    pub fn skipped_count(&self) -> usize {
        self.records.iter().filter(|r| r.reason.is_some()).count()
    }

    /// All records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CrawlUrl> {
        self.records.iter()
    }

    fn insert(
        &mut self,
        url: Url,
        found_on: Option<Url>,
        state: UrlState,
        reason: Option<String>,
    ) -> UrlId {
        let id = UrlId(self.records.len());
        self.index.insert(url.as_str().to_string(), id);
        self.records.push(CrawlUrl {
            id,
            url,
            found_on,
            state,
            reason,
        });
        id
    }

    fn advance(&mut self, id: UrlId, next: UrlState, reason: Option<&str>) -> bool {
        let Some(record) = self.records.get_mut(id.0) else {
            return false;
        };

        if !record.state.can_advance_to(next) {
            tracing::debug!(
                "Ignoring transition of {} from {} to {}",
                record.url,
                record.state,
                next
            );
            return false;
        }

        record.state = next;
        if let Some(reason) = reason {
            record.reason = Some(reason.to_string());
        }
        self.pending.remove(&id);
        true
    }
}
