use std::fmt;

use zenstate_raw::current_arch::hwcr::{self, msr::HWCR};
use zenstate_raw::current_arch::pstate::{self, PStateDef, PSTATE_COUNT};
use zenstate_raw::RegisterLayout;

use crate::common::msr::{RegisterTransport, WriteTarget};
use crate::config::PStateEdit;
use crate::error::{Result, ZenstateError};
use crate::orchestrator::Step;

/// One field modification, in the order it was applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldChange {
    Enable,
    Disable,
    Fid(u8),
    Did(u8),
    Vid(u8),
    /// Voltage request, resolved to the VID actually written
    Vcore { vid: u8, vcore: f64 },
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldChange::Enable => write!(f, "Enabling state"),
            FieldChange::Disable => write!(f, "Disabling state"),
            FieldChange::Fid(fid) => write!(f, "Setting FID to {fid:X}"),
            FieldChange::Did(did) => write!(f, "Setting DID to {did:X}"),
            FieldChange::Vid(vid) => write!(f, "Setting VID to {vid:X}"),
            FieldChange::Vcore { vid, vcore } => {
                write!(f, "Setting vCore to {vcore:.5}V (VID = {vid:X})")
            }
        }
    }
}

/// Outcome of a P-State edit
#[derive(Debug, Clone, PartialEq)]
pub struct MutationReport {
    pub index: usize,
    pub before: u64,
    pub after: u64,
    pub changes: Vec<FieldChange>,
    /// The TSC lock had to be set on every CPU before writing
    pub tsc_lock_applied: bool,
    /// The new value was broadcast; false when the edit was a no-op
    pub written: bool,
}

impl MutationReport {
    pub fn before_def(&self) -> PStateDef {
        PStateDef::from_msr_value(self.before)
    }

    pub fn after_def(&self) -> PStateDef {
        PStateDef::from_msr_value(self.after)
    }
}

/// Range-check an edit and resolve its vCore to a VID
///
/// Runs before any register access so that a bad request never reaches
/// hardware.
fn validate(index: usize, edit: &PStateEdit) -> Result<Option<FieldChange>> {
    if index >= PSTATE_COUNT {
        return Err(ZenstateError::InvalidRequest(format!(
            "P-State index {index} out of range 0-{}",
            PSTATE_COUNT - 1
        )));
    }

    if let Some(did) = edit.did {
        PStateDef {
            did,
            ..Default::default()
        }
        .validate()
        .map_err(|e| ZenstateError::InvalidRequest(format!("DID 0x{did:X}: {e}")))?;
    }

    if edit.enable && edit.disable {
        tracing::warn!("Both enable and disable requested for P{index}, disable is applied last");
    }

    if edit.vid.is_some() && edit.vcore.is_some() {
        tracing::warn!("Both VID and vCore requested for P{index}, vCore takes precedence");
    }

    let Some(vcore) = edit.vcore else {
        return Ok(None);
    };

    // VIDs above 0xF8 encode negative voltages, which are never a valid target
    if vcore.is_sign_negative() {
        return Err(ZenstateError::InvalidVoltage { vcore });
    }
    let vid = pstate::vcore_to_vid(vcore).ok_or(ZenstateError::InvalidVoltage { vcore })?;
    Ok(Some(FieldChange::Vcore {
        vid,
        vcore: pstate::vid_to_vcore(vid),
    }))
}

/// Apply `edit` to `value` in the fixed field order
fn apply_fields(
    mut value: u64,
    edit: &PStateEdit,
    vcore: Option<FieldChange>,
) -> (u64, Vec<FieldChange>) {
    let mut changes = Vec::new();

    if edit.enable {
        value = pstate::set_enabled(value, true);
        changes.push(FieldChange::Enable);
    }
    if edit.disable {
        value = pstate::set_enabled(value, false);
        changes.push(FieldChange::Disable);
    }
    if let Some(fid) = edit.fid {
        value = pstate::set_fid(value, fid);
        changes.push(FieldChange::Fid(fid));
    }
    if let Some(did) = edit.did {
        value = pstate::set_did(value, did);
        changes.push(FieldChange::Did(did));
    }
    if let Some(vid) = edit.vid {
        value = pstate::set_vid(value, vid);
        changes.push(FieldChange::Vid(vid));
    }
    if let Some(change @ FieldChange::Vcore { vid, .. }) = vcore {
        value = pstate::set_vid(value, vid);
        changes.push(change);
    }

    (value, changes)
}

/// Set the TSC frequency lock on every CPU unless the primary CPU has it
///
/// Returns whether any lock write was issued. Each CPU's own HWCR is read
/// and written back with only the lock bit added.
pub fn ensure_tsc_locked<T: RegisterTransport + ?Sized>(transport: &T) -> Result<bool> {
    let primary = transport.primary_cpu();
    let current = transport
        .read(primary, HWCR)
        .map_err(ZenstateError::access(Step::ReadHwcr))?;

    if hwcr::tsc_locked(current) {
        tracing::debug!("TSC frequency already locked");
        return Ok(false);
    }

    tracing::debug!("Locking TSC frequency");
    for &cpu in transport.cpus() {
        let value = transport
            .read(cpu, HWCR)
            .map_err(ZenstateError::access(Step::LockTsc))?;
        transport
            .write(WriteTarget::Cpu(cpu), HWCR, hwcr::lock_tsc(value))
            .map_err(ZenstateError::access(Step::LockTsc))?;
    }

    Ok(true)
}

/// Edit P-State `index` on every CPU
///
/// The current definition is read from the primary CPU. When the edit
/// changes nothing, no register is written. Otherwise the TSC lock is
/// ensured first and the new definition is broadcast. A failure aborts the
/// remaining steps without rolling back. The error names the step and, once
/// the current value is known, carries the partial report so the caller can
/// tell whether the TSC lock was applied by this run.
pub fn apply_pstate_edit<T: RegisterTransport + ?Sized>(
    transport: &T,
    index: usize,
    edit: &PStateEdit,
) -> Result<MutationReport> {
    let vcore = validate(index, edit)?;
    let address = pstate::msr::pstate_def(index);

    let before = transport
        .read(transport.primary_cpu(), address)
        .map_err(ZenstateError::access(Step::ReadPState))?;

    let (after, changes) = apply_fields(before, edit, vcore);
    let mut report = MutationReport {
        index,
        before,
        after,
        changes,
        tsc_lock_applied: false,
        written: false,
    };

    if after == before {
        tracing::info!("P{index} unchanged, nothing to write");
        return Ok(report);
    }

    report.tsc_lock_applied = ensure_tsc_locked(transport).map_err(|e| e.interrupted(&report))?;

    transport
        .write(WriteTarget::All, address, after)
        .map_err(ZenstateError::access(Step::WritePState))
        .map_err(|e| e.interrupted(&report))?;
    report.written = true;

    tracing::debug!("P{index}: 0x{before:016x} -> 0x{after:016x}");
    Ok(report)
}
