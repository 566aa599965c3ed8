// Snapshot of every P-State definition and the C6 flags

use serde::Serialize;
use std::fmt;

use zenstate_raw::current_arch::pstate::{self, PStateDef, PSTATE_COUNT};
use zenstate_raw::RegisterLayout;

use crate::common::msr::RegisterTransport;
use crate::error::{Result, ZenstateError};
use crate::orchestrator::{read_c6, Step};

/// Multiplier of an enabled P-State, or `InvalidEncoding` when DID is 0
pub fn ratio(def: &PStateDef) -> Result<f64> {
    def.ratio()
        .ok_or(ZenstateError::InvalidEncoding { did: def.did })
}

/// One-line summary of a P-State definition
///
/// An undefined ratio is shown in place and logged as a warning; it never
/// aborts the caller.
pub fn describe(def: &PStateDef) -> String {
    if !def.enabled {
        return "Disabled".to_string();
    }

    let ratio = match ratio(def) {
        Ok(ratio) => format!("{ratio:.2}"),
        Err(e) => {
            tracing::warn!("{e}");
            "undefined".to_string()
        }
    };

    format!(
        "Enabled - FID = {:X} - DID = {:X} - VID = {:X} - Ratio = {} - vCore = {:.5}",
        def.fid,
        def.did,
        def.vid,
        ratio,
        def.vcore()
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PStateEntry {
    pub index: usize,
    pub raw: String,
    pub enabled: bool,
    pub fid: u8,
    pub did: u8,
    pub vid: u8,
    pub ratio: Option<f64>,
    pub vcore: f64,
}

impl PStateEntry {
    fn new(index: usize, value: u64) -> Self {
        let def = PStateDef::from_msr_value(value);
        Self {
            index,
            raw: format!("0x{value:016X}"),
            enabled: def.enabled,
            fid: def.fid,
            did: def.did,
            vid: def.vid,
            ratio: def.ratio(),
            vcore: def.vcore(),
        }
    }

    fn def(&self) -> PStateDef {
        PStateDef {
            enabled: self.enabled,
            fid: self.fid,
            did: self.did,
            vid: self.vid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct C6State {
    pub package: bool,
    pub core: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub cpu: u32,
    pub pstates: Vec<PStateEntry>,
    pub c6: C6State,
}

impl Listing {
    /// Read all P-State definitions and C6 registers from `cpu`
    pub fn capture<T: RegisterTransport + ?Sized>(transport: &T, cpu: u32) -> Result<Self> {
        let pstates = (0..PSTATE_COUNT)
            .map(|index| {
                transport
                    .read(cpu, pstate::msr::pstate_def(index))
                    .map(|value| PStateEntry::new(index, value))
                    .map_err(ZenstateError::access(Step::ReadPState))
            })
            .collect::<Result<Vec<_>>>()?;

        let c6 = read_c6(transport, cpu)?;

        Ok(Self {
            cpu,
            pstates,
            c6: C6State {
                package: c6.package,
                core: c6.core,
            },
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn enabled_str(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.pstates {
            writeln!(f, "P{} - {}", entry.index, describe(&entry.def()))?;
        }
        writeln!(f, "C6 State - Package - {}", enabled_str(self.c6.package))?;
        write!(f, "C6 State - Core - {}", enabled_str(self.c6.core))
    }
}
