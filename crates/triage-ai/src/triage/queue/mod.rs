//! Operator priority queue over finished call results.

mod export;

pub use export::{QueueRow, REPORT_FILE_NAME};

use super::engine::CallResult;
use serde::Serialize;
use std::cmp::Reverse;

/// Size of the operator summary shown above the full queue.
pub const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    /// 1-based position after sorting.
    pub rank: usize,
    #[serde(flatten)]
    pub result: CallResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallQueue {
    entries: Vec<QueueEntry>,
}

impl CallQueue {
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The highest-priority calls, at most [`TOP_N`].
    pub fn operator_summary(&self) -> &[QueueEntry] {
        &self.entries[..self.entries.len().min(TOP_N)]
    }
}

/// Orders a batch by urgency, highest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueRanker;

impl QueueRanker {
    /// Equal urgencies keep their submission order.
    pub fn rank(&self, mut results: Vec<CallResult>) -> CallQueue {
        results.sort_by_key(|result| Reverse(result.urgency()));
        let entries = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| QueueEntry {
                rank: index + 1,
                result,
            })
            .collect();
        CallQueue { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::engine::TriageEngine;

    fn result(filename: &str, transcript: &str, stress: f64) -> CallResult {
        TriageEngine::default().assess(filename, transcript, stress)
    }

    #[test]
    fn ties_keep_submission_order() {
        let batch = vec![
            result("first.wav", "he is hurt", 52.0),
            result("critical.wav", "I'm trapped under rubble, please help, panic!", 80.0),
            result("second.wav", "my leg is broken", 52.0),
        ];
        let urgencies: Vec<u8> = batch.iter().map(CallResult::urgency).collect();
        assert_eq!(urgencies, vec![45, 92, 45]);

        let queue = QueueRanker.rank(batch);
        let order: Vec<(usize, &str, u8)> = queue
            .entries()
            .iter()
            .map(|entry| (entry.rank, entry.result.filename(), entry.result.urgency()))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "critical.wav", 92),
                (2, "first.wav", 45),
                (3, "second.wav", 45),
            ]
        );
    }

    #[test]
    fn summary_is_capped_at_three() {
        let batch = (0..5)
            .map(|i| result(&format!("call-{i}.wav"), "there is smoke", f64::from(i) * 20.0))
            .collect();
        let queue = QueueRanker.rank(batch);
        assert_eq!(queue.len(), 5);
        let summary: Vec<&str> = queue
            .operator_summary()
            .iter()
            .map(|entry| entry.result.filename())
            .collect();
        assert_eq!(summary, vec!["call-4.wav", "call-3.wav", "call-2.wav"]);
    }

    #[test]
    fn short_and_empty_batches() {
        let empty = QueueRanker.rank(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.operator_summary().is_empty());

        let single = QueueRanker.rank(vec![result("only.wav", "", 30.0)]);
        assert_eq!(single.operator_summary().len(), 1);
        assert_eq!(single.entries()[0].rank, 1);
    }

    #[test]
    fn entries_serialize_rank_alongside_result() {
        let queue = QueueRanker.rank(vec![result("only.wav", "we are safe", 10.0)]);
        let value = serde_json::to_value(queue.entries()).expect("serializes");
        assert_eq!(value[0]["rank"], 1);
        assert_eq!(value[0]["filename"], "only.wav");
        assert_eq!(value[0]["situation"], "SAFE");
    }
}
