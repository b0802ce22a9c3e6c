//! Hold pull-list pipeline stages.
//!
//! A branch's pull list moves through four stages:
//! 1. [`PullListFetcher`] fetches the list and normalizes each entry into a
//!    [`HoldChain`].
//! 2. [`EnrichmentOrchestrator`] resolves whatever each chain is missing.
//! 3. [`aggregate`] flattens resolved holds into [`ReportRow`]s.
//! 4. [`sort_rows`] orders rows for the printed lists.

mod aggregate;
mod enrich;
mod fetcher;
mod sort;
mod types;

pub use aggregate::aggregate;
pub use enrich::{EnrichmentOrchestrator, EnrichmentOutcome};
pub use fetcher::{normalize_entry, PullListFetcher};
pub use sort::{collate, compare_rows, sort_rows, CollationKey};
pub use types::*;
