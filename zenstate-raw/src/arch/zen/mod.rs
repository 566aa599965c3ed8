//! AMD Zen family register definitions
//!
//! This module provides the fixed register layout shared by AMD family 17h
//! and later processors (Zen through Zen 5) for operating point and idle
//! state control.
//!
//! ## Registers
//!
//! - **PStateDef** - Eight P-State definition registers (FID/DID/VID)
//! - **HWCR** - Hardware configuration, holds the TSC frequency lock
//! - **C6** - Package and core level C6 enable bits
//!
//! ## References
//!
//! - AMD Processor Programming Reference (PPR) for Family 17h
//! - BIOS and Kernel Developer's Guide (BKDG), MSRC001_00[6B:64]

pub mod cstate;
pub mod hwcr;
pub mod pstate;
