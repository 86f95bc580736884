// Paginated search
// `SearchAggregator` turns a query plus a duration filter into pages of
// candidates; `SearchSession` is the per-query state it keeps.

pub mod aggregator;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::youtube::models::Candidate;

pub use aggregator::SearchAggregator;
pub use session::{QueryKind, SearchSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationFilter {
    #[default]
    All,
    Min30,
    Min60,
}

impl DurationFilter {
    pub fn min_seconds(&self) -> Option<u64> {
        match self {
            DurationFilter::All => None,
            DurationFilter::Min30 => Some(30 * 60),
            DurationFilter::Min60 => Some(60 * 60),
        }
    }

    pub fn admits(&self, candidate: &Candidate) -> bool {
        match self.min_seconds() {
            None => true,
            Some(floor) => candidate.duration_seconds >= floor,
        }
    }
}

impl fmt::Display for DurationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationFilter::All => write!(f, "all"),
            DurationFilter::Min30 => write!(f, "min30"),
            DurationFilter::Min60 => write!(f, "min60"),
        }
    }
}

impl FromStr for DurationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DurationFilter::All),
            "min30" | "30min" | "30" => Ok(DurationFilter::Min30),
            "min60" | "60min" | "60" => Ok(DurationFilter::Min60),
            _ => Err(format!("Invalid filter: '{}'. Valid: all, min30, min60", s)),
        }
    }
}

// What the current session shows after an operation
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub page: u32,
    pub results: Vec<Candidate>,
    pub has_next: bool,
    /// The filter changed since this page was fetched; resubmit for a full page
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Page(PageView),
    /// Nothing qualified. Not an error.
    Empty { page: u32 },
    /// A newer query or page request replaced this one before it finished;
    /// its result was dropped.
    Superseded,
}

impl PageOutcome {
    pub(crate) fn from_session(session: &SearchSession) -> Self {
        if session.results().is_empty() {
            return PageOutcome::Empty {
                page: session.current_page(),
            };
        }
        PageOutcome::Page(PageView {
            page: session.current_page(),
            results: session.results().to_vec(),
            has_next: session.has_next_page(),
            partial: session.is_partial(),
        })
    }

    pub fn results(&self) -> &[Candidate] {
        match self {
            PageOutcome::Page(view) => &view.results,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PageOutcome::Empty { .. })
    }
}
