use std::path::PathBuf;

use crate::task::TaskKind;

/// One failed (file, task) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub relative: PathBuf,
    pub task: TaskKind,
    pub reason: String,
}

/// Counters accumulated over one run.
///
/// File counters partition the discovered files: a file with any failed task
/// is failed, a file whose every task was skipped is skipped, anything else
/// succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub discovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Translation outputs written.
    pub translated: usize,
    /// Summary outputs written.
    pub summarized: usize,
    pub failures: Vec<FailureRecord>,
}

impl RunStats {
    pub(crate) const fn record_written(&mut self, task: TaskKind) {
        match task {
            TaskKind::Translation => self.translated += 1,
            TaskKind::Summarization => self.summarized += 1,
        }
    }

    pub(crate) fn record_failure(&mut self, failure: FailureRecord) {
        self.failures.push(failure);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Failure reason recorded for a file and task, if any.
    pub fn failure_for(&self, relative: &std::path::Path, task: TaskKind) -> Option<&str> {
        self.failures
            .iter()
            .find(|f| f.relative == relative && f.task == task)
            .map(|f| f.reason.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_record_written_per_task() {
        let mut stats = RunStats::default();
        stats.record_written(TaskKind::Translation);
        stats.record_written(TaskKind::Translation);
        stats.record_written(TaskKind::Summarization);

        assert_eq!(stats.translated, 2);
        assert_eq!(stats.summarized, 1);
    }

    #[test]
    fn test_failure_lookup() {
        let mut stats = RunStats::default();
        assert!(!stats.has_failures());

        stats.record_failure(FailureRecord {
            relative: PathBuf::from("b/p2.pdf"),
            task: TaskKind::Summarization,
            reason: "rate limited".to_string(),
        });

        assert!(stats.has_failures());
        assert_eq!(
            stats.failure_for(Path::new("b/p2.pdf"), TaskKind::Summarization),
            Some("rate limited")
        );
        assert_eq!(
            stats.failure_for(Path::new("b/p2.pdf"), TaskKind::Translation),
            None
        );
    }
}
