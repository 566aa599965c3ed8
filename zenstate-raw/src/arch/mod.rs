//! Architecture-specific register definitions
//!
//! The P-State, HWCR and C6 registers sit at fixed addresses with a fixed
//! layout across the AMD Zen generations, so a single module covers them.
//!
//! ## Supported Architectures
//!
//! - **Zen** (`zen` feature) - AMD family 17h, 19h and 1Ah

#[cfg(feature = "zen")]
pub mod zen;
