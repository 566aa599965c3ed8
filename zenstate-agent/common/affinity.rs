use nix::sched::{sched_getaffinity, sched_setaffinity, CpuSet};
use nix::unistd::Pid;

use crate::error::{Result, ZenstateError};

// Pid 0 addresses the calling thread
const CALLING_THREAD: Pid = Pid::from_raw(0);

/// Keeps the calling thread on one CPU until dropped
///
/// The affinity mask in place before pinning is restored on drop.
pub struct AffinityGuard {
    cpu: u32,
    previous: CpuSet,
}

impl AffinityGuard {
    pub fn pin(cpu: u32) -> Result<Self> {
        let previous = sched_getaffinity(CALLING_THREAD).map_err(|e| {
            ZenstateError::AffinityError(format!("cannot read the current mask: {e}"))
        })?;

        let mut target = CpuSet::new();
        target
            .set(cpu as usize)
            .and_then(|()| sched_setaffinity(CALLING_THREAD, &target))
            .map_err(|e| ZenstateError::AffinityError(format!("cannot pin to CPU {cpu}: {e}")))?;

        Ok(Self { cpu, previous })
    }
}

impl Drop for AffinityGuard {
    fn drop(&mut self) {
        if let Err(e) = sched_setaffinity(CALLING_THREAD, &self.previous) {
            tracing::warn!("Affinity not restored after pinning to CPU {}: {}", self.cpu, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_cpu_is_rejected() {
        let result = AffinityGuard::pin(CpuSet::count() as u32);
        assert!(matches!(result, Err(ZenstateError::AffinityError(_))));
    }

    #[test]
    fn test_affinity_restored_on_drop() {
        let before = sched_getaffinity(CALLING_THREAD).unwrap();
        if let Ok(guard) = AffinityGuard::pin(0) {
            assert_eq!(guard.cpu, 0);
            drop(guard);
        }
        assert_eq!(sched_getaffinity(CALLING_THREAD).unwrap(), before);
    }
}
