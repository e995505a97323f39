//! Progress reporting for a single extraction.
//!
//! The pipeline sets the total once, before the first read, and advances
//! the completed count by the length of every chunk it hands to the sink.
//! Passing `None` wherever a progress argument is accepted turns all of
//! this off.

/// A mutable counter with a total and a completed amount.
///
/// Units are bytes for regular files and a single unit for directories
/// and symbolic links.
pub trait Progress {
    fn total(&self) -> u64;

    fn set_total(&mut self, total: u64);

    fn completed(&self) -> u64;

    fn set_completed(&mut self, completed: u64);

    /// Advance the completed amount by `units`.
    fn advance(&mut self, units: u64) {
        let completed = self.completed().saturating_add(units);
        self.set_completed(completed);
    }
}

/// Plain in-memory counter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCounter {
    pub total: u64,
    pub completed: u64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.total
    }
}

impl Progress for ProgressCounter {
    fn total(&self) -> u64 {
        self.total
    }

    fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    fn completed(&self) -> u64 {
        self.completed
    }

    fn set_completed(&mut self, completed: u64) {
        self.completed = completed;
    }
}

/// Scoped handle over an optional progress counter.
///
/// When dropped, on success and on every error path alike, it marks the
/// counter as complete so a progress bar never stops short.
pub(crate) struct ProgressGuard<'a> {
    progress: Option<&'a mut dyn Progress>,
}

impl<'a> ProgressGuard<'a> {
    pub(crate) fn start(progress: Option<&'a mut dyn Progress>, total: u64) -> Self {
        let mut progress = progress;
        if let Some(p) = progress.as_deref_mut() {
            p.set_total(total);
        }
        Self { progress }
    }

    pub(crate) fn advance(&mut self, units: u64) {
        if let Some(p) = self.progress.as_deref_mut() {
            p.advance(units);
        }
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        if let Some(p) = self.progress.as_deref_mut() {
            let total = p.total();
            p.set_completed(total);
        }
    }
}
