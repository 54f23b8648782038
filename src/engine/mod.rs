//! Processing engine contract
//!
//! The orchestration layer talks to an engine only through [`Engine`]. Each
//! entry point receives its request plus a progress callback and an error
//! callback, and delivers events to them sequentially in the order they were
//! observed. Per-item failures are both reported and collected in the
//! returned [`RunResult`].

pub mod events;
pub mod local;

pub use events::{
    CheckError, CheckProgress, ConversionError, ConversionProgress, FileProcessingError,
    FixDateError, FixDateProgress, SortProgress,
};
pub use local::LocalEngine;

use crate::config::{ConvertRequest, RunConfiguration};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// One item the engine could not process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an engine run that reached its end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub processed_count: usize,
    pub errors: Vec<ItemFailure>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&mut self) {
        self.processed_count += 1;
    }

    pub fn record_failure(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.errors.push(ItemFailure {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Failures that end a run
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Access to '{}' was denied", .0.display())]
    AccessDenied(PathBuf),

    #[error("Folder '{}' is not accessible: {reason}", path.display())]
    FolderNotAccessible { path: PathBuf, reason: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    running: AtomicBool,
}

/// Shared flag asking a running engine to stop before its next item
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<TokenState>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.0.running.load(Ordering::SeqCst)
    }

    /// Start a run: clears an earlier cancellation until the guard drops
    pub fn begin(&self) -> RunGuard<'_> {
        self.0.cancelled.store(false, Ordering::SeqCst);
        self.0.running.store(true, Ordering::SeqCst);
        RunGuard(self)
    }

    /// Cancel the active run. Returns false when no run is active.
    pub fn interrupt(&self) -> bool {
        if self.is_running() {
            self.cancel();
            true
        } else {
            false
        }
    }
}

/// Marks a run as active for as long as it lives
#[derive(Debug)]
pub struct RunGuard<'a>(&'a CancellationToken);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.0.running.store(false, Ordering::SeqCst);
    }
}

/// Entry points of a processing engine
pub trait Engine {
    /// Convert every `request.format` image in `request.folder`
    fn convert(
        &self,
        request: &ConvertRequest,
        progress: &mut dyn FnMut(ConversionProgress),
        errors: &mut dyn FnMut(ConversionError),
    ) -> Result<RunResult, EngineError>;

    /// Sort the source tree into the destination
    fn sort(
        &self,
        config: &RunConfiguration,
        progress: &mut dyn FnMut(SortProgress),
        errors: &mut dyn FnMut(FileProcessingError),
    ) -> Result<RunResult, EngineError>;

    /// Reset file timestamps from each file's content date
    fn fix_dates(
        &self,
        folder: &Path,
        progress: &mut dyn FnMut(FixDateProgress),
        errors: &mut dyn FnMut(FixDateError),
    ) -> Result<RunResult, EngineError>;

    /// Stamp every file in `folder` with `date`
    fn force_date(
        &self,
        folder: &Path,
        date: NaiveDateTime,
        progress: &mut dyn FnMut(FixDateProgress),
        errors: &mut dyn FnMut(FixDateError),
    ) -> Result<RunResult, EngineError>;

    /// Report files whose name disagrees with their metadata date
    fn check_names(
        &self,
        folder: &Path,
        progress: &mut dyn FnMut(CheckProgress),
        errors: &mut dyn FnMut(CheckError),
    ) -> Result<RunResult, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_result_counts() {
        let mut result = RunResult::new();
        result.record_processed();
        result.record_processed();
        result.record_failure("/a.jpg", "locked");

        assert_eq!(result.processed_count, 2);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].path, PathBuf::from("/a.jpg"));
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_interrupt_only_cancels_active_run() {
        let token = CancellationToken::new();
        assert!(!token.interrupt());
        assert!(!token.is_cancelled());

        {
            let _run = token.begin();
            assert!(token.is_running());
            assert!(token.interrupt());
            assert!(token.is_cancelled());
        }
        assert!(!token.is_running());

        let _next = token.begin();
        assert!(!token.is_cancelled());
    }
}
