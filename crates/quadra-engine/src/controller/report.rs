use state::InitCell;

use crate::error::InitError;

use super::{Phase, SceneController};

/// Snapshot of the bootstrap outcome, stored process-wide for later
/// inspection and debugging.
#[derive(Debug, Clone)]
pub struct ControllerReport {
    /// Final phase: [`Phase::Rendered`] on success, [`Phase::Failed`] otherwise.
    pub phase: Phase,
    /// The originating error, rendered, when the sequence failed.
    pub error: Option<String>,
    /// Location of the enabled vertex-position attribute.
    pub position_location: Option<u32>,
    /// Name of the adapter the context was acquired on.
    pub adapter: Option<String>,
}

// Exactly one controller is created per process; the slot is set once and
// never replaced.
static REPORT: InitCell<ControllerReport> = InitCell::new();

pub(super) fn record_success(controller: &SceneController) {
    store(ControllerReport {
        phase: controller.phase(),
        error: None,
        position_location: Some(controller.program().position_location),
        adapter: Some(controller.gpu.adapter_name()),
    });
}

pub(super) fn record_failure(err: &InitError) {
    store(ControllerReport {
        phase: Phase::Failed,
        error: Some(err.to_string()),
        position_location: None,
        adapter: None,
    });
}

fn store(report: ControllerReport) {
    if !REPORT.set(report) {
        log::warn!("controller report slot already set; keeping the first outcome");
    }
}

/// Explicit lookup of the recorded bootstrap outcome.
///
/// Returns `None` until a controller construction has run to completion
/// (successfully or not).
pub fn report() -> Option<&'static ControllerReport> {
    REPORT.try_get()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The slot is process-global and set-once, so everything is asserted from
    // a single test.
    #[test]
    fn first_recorded_outcome_wins() {
        assert!(report().is_none());

        record_failure(&InitError::MissingSurfaceId);

        let first = report().expect("report recorded");
        assert_eq!(first.phase, Phase::Failed);
        assert!(first.error.as_deref().is_some_and(|e| !e.is_empty()));

        // A second record must not replace the first.
        record_failure(&InitError::SurfaceNotFound { id: "other".to_string() });
        let still = report().unwrap();
        assert_eq!(still.error, first.error);
    }
}
