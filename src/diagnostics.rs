use std::cell::RefCell;
use std::time::{Duration, Instant};

use tracing::{debug, span::EnteredSpan, warn};

/// How a pipeline stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    /// Left by an error or an early return.
    Aborted,
}

/// One finished stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub name: &'static str,
    pub outcome: StageOutcome,
    pub elapsed: Duration,
    /// Number of stages that were open around this one.
    pub depth: usize,
}

/// Per-run record of pipeline stages, passed explicitly to every stage.
///
/// Replaces process-wide crash state: when a run fails, the records show
/// which stage was active and how far the run got.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: RefCell<Vec<StageRecord>>,
    active: RefCell<Vec<&'static str>>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a stage. It is recorded as aborted unless
    /// [`StageGuard::complete`] is called before the guard drops.
    #[must_use]
    pub fn stage(&self, name: &'static str) -> StageGuard<'_> {
        let depth = {
            let mut active = self.active.borrow_mut();
            active.push(name);
            active.len() - 1
        };
        StageGuard {
            diagnostics: self,
            name,
            depth,
            start: Instant::now(),
            completed: false,
            _span: tracing::info_span!("stage", stage = name).entered(),
        }
    }

    /// Runs `f` inside a stage, completing it when `f` returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn run<T, E>(&self, name: &'static str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let guard = self.stage(name);
        let value = f()?;
        guard.complete();
        Ok(value)
    }

    /// Finished stages in the order they ended.
    #[must_use]
    pub fn records(&self) -> Vec<StageRecord> {
        self.records.borrow().clone()
    }

    /// Innermost open stage, if any.
    #[must_use]
    pub fn active_stage(&self) -> Option<&'static str> {
        self.active.borrow().last().copied()
    }

    /// The first stage that ended without completing.
    #[must_use]
    pub fn first_aborted(&self) -> Option<StageRecord> {
        self.records
            .borrow()
            .iter()
            .find(|r| r.outcome == StageOutcome::Aborted)
            .cloned()
    }

    fn close(&self, record: StageRecord) {
        let pos = self.active.borrow().iter().rposition(|n| *n == record.name);
        if let Some(pos) = pos {
            self.active.borrow_mut().remove(pos);
        }
        match record.outcome {
            StageOutcome::Completed => {
                let elapsed_ms = record.elapsed.as_millis();
                debug!(stage = record.name, elapsed_ms, "stage completed");
            }
            StageOutcome::Aborted => {
                let elapsed_ms = record.elapsed.as_millis();
                warn!(stage = record.name, elapsed_ms, "stage aborted");
            }
        }
        self.records.borrow_mut().push(record);
    }
}

/// Open stage; records its outcome and duration when dropped.
#[must_use = "a stage ends as soon as its guard is dropped"]
pub struct StageGuard<'a> {
    diagnostics: &'a Diagnostics,
    name: &'static str,
    depth: usize,
    start: Instant,
    completed: bool,
    _span: EnteredSpan,
}

impl StageGuard<'_> {
    /// Marks the stage as completed and closes it.
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        self.diagnostics.close(StageRecord {
            name: self.name,
            outcome: if self.completed {
                StageOutcome::Completed
            } else {
                StageOutcome::Aborted
            },
            elapsed: self.start.elapsed(),
            depth: self.depth,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_stage_is_recorded() {
        let diag = Diagnostics::new();
        diag.stage("levels").complete();
        let records = diag.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "levels");
        assert_eq!(records[0].outcome, StageOutcome::Completed);
        assert!(diag.active_stage().is_none());
    }

    #[test]
    fn dropped_guard_is_aborted() {
        let diag = Diagnostics::new();
        {
            let _guard = diag.stage("extract");
            assert_eq!(diag.active_stage(), Some("extract"));
        }
        assert_eq!(diag.first_aborted().map(|r| r.name), Some("extract"));
    }

    #[test]
    fn nested_stages_record_depth() {
        let diag = Diagnostics::new();
        let outer = diag.stage("run");
        diag.stage("assemble").complete();
        outer.complete();
        let records = diag.records();
        assert_eq!(records[0].name, "assemble");
        assert_eq!(records[0].depth, 1);
        assert_eq!(records[1].name, "run");
        assert_eq!(records[1].depth, 0);
    }

    #[test]
    fn run_aborts_on_error() {
        let diag = Diagnostics::new();
        let ok: Result<i32, &str> = diag.run("ok", || Ok(3));
        assert_eq!(ok, Ok(3));
        let err: Result<i32, &str> = diag.run("fails", || Err("boom"));
        assert!(err.is_err());
        let records = diag.records();
        assert_eq!(records[0].outcome, StageOutcome::Completed);
        assert_eq!(records[1].outcome, StageOutcome::Aborted);
    }
}
