//! Run tally
//!
//! Counters threaded through a run in place of global state. The error count
//! decides how the process finishes.

use std::fmt;

/// Counts of layers processed, layers edited and errors seen during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    /// Layers the run attempted, including ones that failed.
    pub processed: usize,
    /// Layers whose edited metadata was pushed to a draft.
    pub edited: usize,
    /// Local metadata files changed by at least one rule.
    pub documents_changed: usize,
    pub errors: usize,
}

impl RunTally {
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_edited(&mut self) {
        self.edited += 1;
    }

    pub fn record_document_changed(&mut self) {
        self.documents_changed += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// True when no errors were recorded
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// The one-line message printed when the process ends
    pub fn completion_message(&self) -> String {
        if self.is_success() {
            "COMPLETE. No errors".to_string()
        } else {
            format!(
                "Process failed with {} error(s). Please see log for critical messages",
                self.errors
            )
        }
    }
}

impl fmt::Display for RunTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} layer(s) processed | {} layer(s) edited | {} error(s)",
            self.processed, self.edited, self.errors
        )
    }
}
