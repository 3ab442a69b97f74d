//! history.rs: append-only per-analyzer record of produced results.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::AnalysisResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// 0-based position in this analyzer's history.
    pub seq: u64,
    pub post_id: String,
    pub result: AnalysisResult,
}

/// Owned by exactly one analyzer instance. Appends are serialized by the
/// mutex; reads hand out copies so a reader never sees a half-written view.
#[derive(Debug, Default)]
pub struct AnalysisHistory {
    inner: Mutex<Vec<HistoryEntry>>,
    /// Held across evaluate + record.
    turn: Mutex<()>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HistoryEntry>> {
        // Entries are only ever pushed whole, so a poisoned vec is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize one evaluate + record pair against other callers of the
    /// same analyzer.
    pub(crate) fn begin(&self) -> MutexGuard<'_, ()> {
        self.turn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one entry and return its sequence number. Crate-private: only
    /// `AnalyzerExt::analyze` records.
    pub(crate) fn record(&self, post_id: &str, result: AnalysisResult) -> u64 {
        let mut v = self.lock();
        let seq = v.len() as u64;
        v.push(HistoryEntry {
            seq,
            post_id: post_id.to_string(),
            result,
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent copy of the whole history.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.lock().clone()
    }

    /// Copy of entries with `seq >= offset` (one run's worth, when `offset`
    /// is the length observed before the run started).
    pub fn entries_from(&self, offset: usize) -> Vec<HistoryEntry> {
        let v = self.lock();
        v.get(offset..).map(<[_]>::to_vec).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{CategoryResult, StatsResult};
    use std::sync::Arc;

    fn cat(label: &str) -> AnalysisResult {
        AnalysisResult::Category(CategoryResult {
            label: label.to_string(),
            confidence: 1.0,
            tone: 0.0,
            cues: Vec::new(),
            keyword_hits: 1,
        })
    }

    #[test]
    fn appends_in_order_and_snapshots_are_copies() {
        let h = AnalysisHistory::new();
        assert!(h.is_empty());
        assert_eq!(h.record("a", cat("x")), 0);
        assert_eq!(h.record("b", cat("y")), 1);

        let snap = h.snapshot();
        h.record("c", AnalysisResult::Stats(StatsResult::default()));
        assert_eq!(snap.len(), 2);
        assert_eq!(h.len(), 3);
        assert_eq!(h.entries_from(1).len(), 2);
        assert_eq!(h.entries_from(1)[0].post_id, "b");
        assert!(h.entries_from(10).is_empty());
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let h = Arc::new(AnalysisHistory::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let h = Arc::clone(&h);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        h.record(&format!("{t}-{i}"), cat("x"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snap = h.snapshot();
        assert_eq!(snap.len(), 1000);
        assert!(snap.iter().enumerate().all(|(i, e)| e.seq == i as u64));
    }
}
