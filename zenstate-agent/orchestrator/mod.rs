// Register mutation orchestration
// Every edit is a read-modify-write against an injected RegisterTransport

pub mod cstate;
pub mod pstate;

pub use cstate::{read_c6, set_c6, C6Report};
pub use pstate::{apply_pstate_edit, ensure_tsc_locked, FieldChange, MutationReport};

crate::named_enum! {
    /// Register operation in progress when an access failed
    pub enum Step {
        Discover => "discover CPUs",
        ReadPState => "read P-State",
        ReadHwcr => "read HWCR",
        LockTsc => "lock TSC",
        WritePState => "write P-State",
        ReadC6Package => "read C6 package",
        WriteC6Package => "write C6 package",
        ReadC6Core => "read C6 core",
        WriteC6Core => "write C6 core",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_step_names_are_unique() {
        let names: HashSet<_> = Step::all().iter().map(Step::name).collect();
        assert_eq!(names.len(), Step::all().len());
    }
}
