//! Per-run outcome accounting.
//!
//! Every stage funnels skipped files, failures and destructive actions
//! through a [`StageReport`], which logs them as they happen and decides the
//! process exit code at the end.

use std::fmt::Display;
use std::process::ExitCode;

use crate::log;
use crate::utils::fmt::{format_kib, plural_count};

use super::StageError;

/// Exit code when at least one precondition violation was recorded.
pub const VIOLATION_EXIT: u8 = 2;

#[derive(Debug, Default)]
pub struct StageReport {
    warnings: usize,
    violations: Vec<String>,
    removed: usize,
    moved: usize,
    written: usize,
    reclaimed: u64,
}

impl StageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed operation. Precondition violations block the run's
    /// success; everything else is a warning.
    pub fn record(&mut self, module: &str, err: StageError) {
        if err.is_precondition() {
            log!("violation"; "{}: {}", module, err);
            self.violations.push(err.to_string());
        } else {
            log!("warn"; "{}: {}", module, err.detail());
            self.warnings += 1;
        }
    }

    /// Record a file that was deliberately left alone.
    pub fn skip(&mut self, module: &str, path: impl Display, reason: &str) {
        log!("warn"; "{}: skipped `{}`: {}", module, path, reason);
        self.warnings += 1;
    }

    /// Record a deleted representation and the bytes it freed.
    pub fn removed(&mut self, module: &str, path: impl Display, bytes: u64) {
        log!(module; "removed {} ({} bytes)", path, bytes);
        self.removed += 1;
        self.reclaimed += bytes;
    }

    /// Record a file relocated out of the deployment root.
    pub fn moved(&mut self, module: &str, path: impl Display, bytes: u64) {
        log!(module; "moved {} ({} bytes)", path, bytes);
        self.moved += 1;
        self.reclaimed += bytes;
    }

    /// Record a file created or rewritten.
    pub fn written(&mut self, module: &str, path: impl Display) {
        crate::debug!(module; "wrote {}", path);
        self.written += 1;
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    #[cfg(test)]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    #[cfg(test)]
    pub const fn warnings(&self) -> usize {
        self.warnings
    }

    #[cfg(test)]
    pub const fn removed_count(&self) -> usize {
        self.removed
    }

    #[cfg(test)]
    pub const fn moved_count(&self) -> usize {
        self.moved
    }

    #[cfg(test)]
    pub const fn written_count(&self) -> usize {
        self.written
    }

    #[cfg(test)]
    pub const fn reclaimed(&self) -> u64 {
        self.reclaimed
    }

    pub fn summary(&self) -> String {
        format!(
            "wrote {}, removed {}, moved {}, freed {}, {}, {}",
            plural_count(self.written, "file"),
            plural_count(self.removed, "file"),
            plural_count(self.moved, "file"),
            format_kib(self.reclaimed),
            plural_count(self.warnings, "warning"),
            plural_count(self.violations.len(), "violation"),
        )
    }

    pub fn print_summary(&self) {
        if self.has_violations() {
            log!("error"; "{}", self.summary());
        } else {
            log!("done"; "{}", self.summary());
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.has_violations() {
            ExitCode::from(VIOLATION_EXIT)
        } else {
            ExitCode::SUCCESS
        }
    }
}
