pub mod affinity;
pub mod arch;
pub mod cpuid;
pub mod dry_run;
#[cfg(test)]
pub(crate) mod memory;
pub mod msr;

pub use affinity::AffinityGuard;
pub use arch::{detect as detect_architecture, CpuArchitecture, CPU_ARCH};
pub use dry_run::{DryRunTransport, RecordedWrite};
pub use msr::{MsrHandle, MsrTransport, RegisterTransport, TransportResult, WriteTarget};
