use thiserror::Error;
use zenstate_raw::MsrError;

use crate::orchestrator::{MutationReport, Step};

/// Printed after every register access failure
pub const ACCESS_HINT: &str =
    "make sure the msr kernel module is loaded (run 'modprobe msr') and that zenstate runs as root";

#[derive(Error, Debug)]
pub enum ZenstateError {
    #[error("MSR access failed ({step}): {source}; {}", ACCESS_HINT)]
    Access {
        step: Step,
        #[source]
        source: MsrError,
    },

    /// A P-State edit stopped after its current value was read
    ///
    /// `report` holds what was done before the failure, including whether
    /// this run set the TSC lock.
    #[error(
        "MSR access failed ({step}) while editing P{}, TSC lock applied: {}: {source}; {}",
        .report.index,
        .report.tsc_lock_applied,
        ACCESS_HINT
    )]
    Interrupted {
        step: Step,
        report: Box<MutationReport>,
        #[source]
        source: MsrError,
    },

    #[error("Invalid P-State encoding: DID is 0x{did:X}, ratio is undefined")]
    InvalidEncoding { did: u8 },

    #[error("Invalid voltage: {vcore} V does not map to a VID in 0x00-0xFF")]
    InvalidVoltage { vcore: f64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Affinity operation failed: {0}")]
    AffinityError(String),

    #[error("JSON encoding failed: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ZenstateError {
    /// Wrap a transport failure with the step that was running
    pub fn access(step: Step) -> impl FnOnce(MsrError) -> Self {
        move |source| ZenstateError::Access { step, source }
    }

    /// Step at which a register access failed, if this is an access error
    pub fn step(&self) -> Option<Step> {
        match self {
            ZenstateError::Access { step, .. } | ZenstateError::Interrupted { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }

    /// Attach the progress of a P-State edit to an access failure
    pub fn interrupted(self, report: &MutationReport) -> Self {
        match self {
            ZenstateError::Access { step, source } => ZenstateError::Interrupted {
                step,
                report: Box::new(report.clone()),
                source,
            },
            other => other,
        }
    }

    /// What a P-State edit had done before it failed
    pub fn partial_report(&self) -> Option<&MutationReport> {
        match self {
            ZenstateError::Interrupted { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZenstateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_names_step_and_hint() {
        let err = ZenstateError::access(Step::LockTsc)(MsrError::UnknownCpu { cpu: 4 });
        let message = err.to_string();
        assert!(message.contains("lock TSC"));
        assert!(message.contains("CPU 4"));
        assert!(message.contains("modprobe msr"));
        assert_eq!(err.step(), Some(Step::LockTsc));
    }

    #[test]
    fn test_non_access_errors_have_no_step() {
        let err = ZenstateError::InvalidVoltage { vcore: 2.0 };
        assert_eq!(err.step(), None);
        assert!(err.to_string().contains("2 V"));
        assert!(err.interrupted(&report()).partial_report().is_none());
    }

    #[test]
    fn test_interrupted_edit_keeps_report() {
        let err = ZenstateError::access(Step::WritePState)(MsrError::UnknownCpu { cpu: 2 })
            .interrupted(&report());

        assert_eq!(err.step(), Some(Step::WritePState));
        assert_eq!(err.partial_report(), Some(&report()));
        let message = err.to_string();
        assert!(message.contains("P3"));
        assert!(message.contains("TSC lock applied: true"));
        assert!(message.contains("modprobe msr"));
    }

    fn report() -> MutationReport {
        MutationReport {
            index: 3,
            before: 0x8000_0000_0012_0A88,
            after: 0x8000_0000_0012_0A90,
            changes: Vec::new(),
            tsc_lock_applied: true,
            written: false,
        }
    }
}
