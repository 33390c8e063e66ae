//! Per-collection and per-batch progress reporting
//!
//! Events go through `tracing`; the library never installs a subscriber.
//! Verbosity is a per-call value rather than global state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default number of documents between batch events
pub const DEFAULT_BATCH: usize = 1000;

/// How much a conversion reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// No events
    Silent,
    /// Collection and batch events
    #[default]
    Info,
    /// Also per-document events
    Debug,
}

impl Verbosity {
    /// Whether per-document events are emitted
    #[must_use]
    pub fn is_debug(self) -> bool {
        self == Self::Debug
    }
}

/// Progress over one collection pass
#[derive(Debug)]
pub struct Progress<'a> {
    verbosity: Verbosity,
    stage: &'static str,
    collection: &'a str,
    total: Option<usize>,
    batch_size: usize,
    processed: usize,
    batches: usize,
}

impl<'a> Progress<'a> {
    /// Start a pass and emit the collection event
    #[must_use]
    pub fn start(
        verbosity: Verbosity,
        stage: &'static str,
        collection: &'a str,
        total: Option<usize>,
        batch_size: usize,
    ) -> Self {
        if verbosity >= Verbosity::Info {
            info!(stage, collection, total, "starting collection");
        }
        Self {
            verbosity,
            stage,
            collection,
            total,
            batch_size: batch_size.max(1),
            processed: 0,
            batches: 0,
        }
    }

    /// Count `n` processed documents; returns `true` if a batch event was emitted
    pub fn advance(&mut self, n: usize) -> bool {
        let before = self.processed / self.batch_size;
        self.processed += n;
        let after = self.processed / self.batch_size;
        if after == before {
            return false;
        }
        self.batches = after;
        if self.verbosity >= Verbosity::Info {
            info!(
                stage = self.stage,
                collection = self.collection,
                processed = self.processed,
                total = self.total,
                "batch processed"
            );
        }
        true
    }

    /// Documents processed so far
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Batch events emitted so far
    #[must_use]
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// End the pass; returns the processed count
    pub fn finish(self) -> usize {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Info => info!(
                stage = self.stage,
                collection = self.collection,
                processed = self.processed,
                "collection done"
            ),
            Verbosity::Debug => debug!(
                stage = self.stage,
                collection = self.collection,
                processed = self.processed,
                batches = self.batches,
                total = self.total,
                "collection done"
            ),
        }
        self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_boundaries() {
        let mut p = Progress::start(Verbosity::Silent, "export", "numbers", Some(5), 2);
        assert!(!p.advance(1));
        assert!(p.advance(1));
        assert!(!p.advance(1));
        assert!(p.advance(3), "crossing two boundaries emits once");
        assert_eq!(p.batches(), 3);
        assert_eq!(p.finish(), 6);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let mut p = Progress::start(Verbosity::Silent, "import", "c", None, 0);
        assert!(p.advance(1));
        assert_eq!(p.processed(), 1);
    }

    #[test]
    fn test_verbosity_from_json() {
        let v: Verbosity = serde_json::from_str(r#""debug""#).unwrap();
        assert!(v.is_debug());
        assert_eq!(Verbosity::default(), Verbosity::Info);
        assert!(Verbosity::Silent < Verbosity::Info);
    }
}
