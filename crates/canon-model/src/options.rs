//! Configuration options for the transformation pipeline.

use serde::{Deserialize, Serialize};

/// Options controlling orchestrator behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Report warning-only validation results to the issue sink.
    pub report_warnings: bool,

    /// Run the localizer over extracted embedded resources as well, so their
    /// ids agree with the localized reference in the parent.
    pub localize_embedded: bool,

    /// Log resource aborts at `warn` level (otherwise `debug`).
    pub warn_on_abort: bool,

    /// Treat mapping warnings as blocking errors.
    pub warnings_are_blocking: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            report_warnings: true,
            localize_embedded: true,
            warn_on_abort: true,
            warnings_are_blocking: false,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for strict processing: any mapping issue aborts the resource.
    pub fn strict() -> Self {
        Self {
            warnings_are_blocking: true,
            ..Self::default()
        }
    }

    pub fn with_report_warnings(mut self, enable: bool) -> Self {
        self.report_warnings = enable;
        self
    }

    pub fn with_localize_embedded(mut self, enable: bool) -> Self {
        self.localize_embedded = enable;
        self
    }

    pub fn with_warn_on_abort(mut self, enable: bool) -> Self {
        self.warn_on_abort = enable;
        self
    }
}
