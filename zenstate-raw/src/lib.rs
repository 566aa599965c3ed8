//! # zenstate-raw
//!
//! Register definitions for AMD Zen P-State and C-State control.
//!
//! This crate provides type-safe codecs for the handful of MSRs
//! (Model-Specific Registers) that define per-core operating points and the
//! C6 idle state, plus the low-level `/dev/cpu/*/msr` primitives used to
//! reach them.
//!
//! ## Features
//!
//! - `zen` (default) - AMD family 17h and later register definitions
//!
//! ## Usage
//!
//! ```
//! use zenstate_raw::current_arch::pstate::{self, PStateDef};
//! use zenstate_raw::RegisterLayout;
//!
//! let def = PStateDef::from_msr_value(0x8000_0000_0012_0A88);
//! assert!(def.enabled);
//! assert_eq!(def.fid, 0x88);
//! assert_eq!(def.did, 0x0A);
//! assert_eq!(def.vid, 0x48);
//!
//! // Raise the voltage by two steps, keep everything else
//! let value = pstate::set_vid(def.to_msr_value(), def.vid - 2);
//! assert_eq!(PStateDef::from_msr_value(value).vid, 0x46);
//! ```

pub mod arch;
pub mod msr;
pub mod register;

// Re-export for convenience
pub use msr::{discover_cpus, open_msr, read_from, write_to, MsrError, Result, DEV_CPU_DIR};
pub use register::RegisterLayout;

// Export current architecture based on feature flag
#[cfg(feature = "zen")]
pub use arch::zen as current_arch;
