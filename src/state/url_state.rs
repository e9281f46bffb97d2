/// Processing state definitions for frontier entries
use std::fmt;

/// Reason recorded for URLs rejected by the scope profile at dispatch time
pub const SHOULD_NOT_CRAWL: &str = "should-not-crawl";

/// Reason recorded for discovered URLs that robots.txt disallows
pub const DISALLOWED_BY_ROBOTS: &str = "disallowed-by-robots";

/// Reason recorded for in-flight URLs abandoned by a cancelled run
pub const CANCELLED: &str = "cancelled";

/// Represents where a URL is in the crawl process
///
/// States only ever advance: `Pending -> Processing -> Processed`, or
/// directly `Pending -> Processed` when a URL is skipped without a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UrlState {
    /// Known but not yet dispatched
    Pending,

    /// Dispatched to the HTTP client, result not yet drained
    Processing,

    /// Finished: fetched, failed, or skipped
    Processed,
}

impl UrlState {
    /// Returns true if moving from `self` to `next` keeps the state monotonic
    pub fn can_advance_to(&self, next: UrlState) -> bool {
        next > *self
    }

    /// Returns true for the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Processed => "processed",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
