//! Sequential multi-package operations.

use serde::Serialize;
use tracing::{info, warn};

use crate::data::Package;
use crate::errors::Result;
use crate::invoker::CancellationToken;

/// Outcome counts of a batch.
///
/// `success + failed + skipped == total` holds for every batch; `skipped` stays zero unless
/// the batch was cancelled.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl BatchResult {
    pub fn is_complete_success(&self) -> bool {
        self.success == self.total
    }
}

type ProgressFn<'a> = Box<dyn FnMut(usize, usize, &str) + 'a>;

/// Drives one operation over a list of packages, one at a time.
///
/// Each item's outcome is final; a failed or faulted item never stops the batch. The
/// progress callback receives the 1-based position, the total and the package name before
/// each attempt.
#[derive(Default)]
pub struct BatchRunner<'a> {
    progress: Option<ProgressFn<'a>>,
    cancellation: Option<CancellationToken>,
}

impl<'a> BatchRunner<'a> {
    pub fn new() -> Self {
        BatchRunner::default()
    }

    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize, usize, &str) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Stops before the next item once `token` is cancelled. The item in flight is not
    /// interrupted by this check.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn run<F>(&mut self, action: &str, items: &[Package], mut operation: F) -> BatchResult
    where
        F: FnMut(&Package) -> Result<bool>,
    {
        let total = items.len();
        let mut result = BatchResult {
            total,
            ..Default::default()
        };
        info!(action, total, "Starting batch");

        for (index, item) in items.iter().enumerate() {
            if self.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
                result.skipped = total - index;
                warn!(action, skipped = result.skipped, "Batch cancelled");
                break;
            }

            if let Some(progress) = self.progress.as_mut() {
                progress(index + 1, total, &item.name);
            }

            match operation(item) {
                Ok(true) => result.success += 1,
                Ok(false) => result.failed += 1,
                Err(e) => {
                    warn!(
                        action,
                        package = %item,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Batch item faulted"
                    );
                    result.failed += 1;
                }
            }
        }

        info!(
            action,
            success = result.success,
            failed = result.failed,
            skipped = result.skipped,
            "Batch finished"
        );
        result
    }
}
