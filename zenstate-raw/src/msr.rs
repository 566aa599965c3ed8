//! MSR (Model-Specific Register) read/write primitives
//!
//! This module provides low-level MSR access through `/dev/cpu/*/msr`.
//! For cached per-CPU handles and broadcast writes, use the register
//! transport in zenstate-agent.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, MsrError>;

/// Directory holding one `<cpu>/msr` device per logical CPU
pub const DEV_CPU_DIR: &str = "/dev/cpu";

/// Errors that can occur during MSR operations
#[derive(Debug, thiserror::Error)]
pub enum MsrError {
    #[error("Failed to open MSR device for CPU {cpu}: {source}")]
    OpenFailed { cpu: u32, source: std::io::Error },

    #[error("Failed to read MSR 0x{msr:X} on CPU {cpu}: {source}")]
    ReadFailed {
        cpu: u32,
        msr: u32,
        source: std::io::Error,
    },

    #[error("Failed to write MSR 0x{msr:X} on CPU {cpu}: {source}")]
    WriteFailed {
        cpu: u32,
        msr: u32,
        source: std::io::Error,
    },

    #[error("Failed to seek to MSR 0x{msr:X} on CPU {cpu}: {source}")]
    SeekFailed {
        cpu: u32,
        msr: u32,
        source: std::io::Error,
    },

    #[error("No MSR devices found under {}", .path.display())]
    NoDevices { path: PathBuf },

    #[error("CPU {cpu} has no MSR device")]
    UnknownCpu { cpu: u32 },
}

impl MsrError {
    /// CPU the failed operation targeted, if any
    pub fn cpu(&self) -> Option<u32> {
        match self {
            MsrError::OpenFailed { cpu, .. }
            | MsrError::ReadFailed { cpu, .. }
            | MsrError::WriteFailed { cpu, .. }
            | MsrError::SeekFailed { cpu, .. }
            | MsrError::UnknownCpu { cpu } => Some(*cpu),
            MsrError::NoDevices { .. } => None,
        }
    }
}

/// Path of the MSR device for `cpu` below `root`
pub fn msr_path(root: &Path, cpu: u32) -> PathBuf {
    root.join(cpu.to_string()).join("msr")
}

/// Open the MSR device for `cpu`
///
/// The device is opened read-write with `O_SYNC` so that every write reaches
/// the register before the call returns.
///
/// # Errors
///
/// Returns [`MsrError::OpenFailed`] if the device does not exist (the `msr`
/// kernel module is not loaded) or the caller lacks `CAP_SYS_RAWIO`.
pub fn open_msr(root: &Path, cpu: u32) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(msr_path(root, cpu))
        .map_err(|e| MsrError::OpenFailed { cpu, source: e })
}

/// Enumerate the CPUs that expose an MSR device below `root`
///
/// Only numeric directory names containing an `msr` node are counted. The
/// result is sorted ascending.
///
/// # Errors
///
/// Returns [`MsrError::NoDevices`] if `root` cannot be listed or holds no
/// MSR devices.
pub fn discover_cpus(root: &Path) -> Result<Vec<u32>> {
    let no_devices = || MsrError::NoDevices {
        path: root.to_path_buf(),
    };

    let mut cpus: Vec<u32> = fs::read_dir(root)
        .map_err(|_| no_devices())?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let cpu = entry.file_name().to_str()?.parse::<u32>().ok()?;
            entry.path().join("msr").exists().then_some(cpu)
        })
        .collect();

    if cpus.is_empty() {
        return Err(no_devices());
    }

    cpus.sort_unstable();
    Ok(cpus)
}

/// Read a 64-bit value from an open MSR device
///
/// # Arguments
///
/// * `device` - MSR device of `cpu`, positioned anywhere
/// * `cpu` - CPU the device belongs to, used for error reporting
/// * `msr` - MSR address (e.g., 0xC0010064 for P-State 0)
///
/// # Errors
///
/// Returns an error if the seek fails or fewer than 8 bytes could be read,
/// which is how the kernel reports an unimplemented MSR.
pub fn read_from<D: Read + Seek>(device: &mut D, cpu: u32, msr: u32) -> Result<u64> {
    device
        .seek(SeekFrom::Start(u64::from(msr)))
        .map_err(|e| MsrError::SeekFailed {
            cpu,
            msr,
            source: e,
        })?;

    let mut buffer = [0u8; 8];
    device
        .read_exact(&mut buffer)
        .map_err(|e| MsrError::ReadFailed {
            cpu,
            msr,
            source: e,
        })?;

    Ok(u64::from_le_bytes(buffer))
}

/// Write a 64-bit value to an open MSR device
///
/// # Errors
///
/// Returns an error if the seek fails or the kernel rejects the write
/// (read-only MSR, reserved bits set, or a #GP on the target CPU).
///
/// # Safety
///
/// Writing incorrect values to MSRs can cause system instability or crashes.
/// Always validate register values using `RegisterLayout::validate()` before writing.
pub fn write_to<D: Write + Seek>(device: &mut D, cpu: u32, msr: u32, value: u64) -> Result<()> {
    device
        .seek(SeekFrom::Start(u64::from(msr)))
        .map_err(|e| MsrError::SeekFailed {
            cpu,
            msr,
            source: e,
        })?;

    device
        .write_all(&value.to_le_bytes())
        .map_err(|e| MsrError::WriteFailed {
            cpu,
            msr,
            source: e,
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zenstate-raw-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_msr_error_display() {
        let err = MsrError::OpenFailed {
            cpu: 0,
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("Failed to open MSR device"));
        assert_eq!(err.cpu(), Some(0));
    }

    #[test]
    fn test_read_write_at_offset() {
        let mut device = Cursor::new(vec![0u8; 64]);
        write_to(&mut device, 3, 16, 0x8000_0000_0000_0805).unwrap();
        assert_eq!(read_from(&mut device, 3, 16).unwrap(), 0x8000_0000_0000_0805);
        assert_eq!(read_from(&mut device, 3, 8).unwrap(), 0);
    }

    #[test]
    fn test_short_read_fails() {
        let mut device = Cursor::new(vec![0u8; 4]);
        let err = read_from(&mut device, 1, 0).unwrap_err();
        assert!(matches!(err, MsrError::ReadFailed { cpu: 1, msr: 0, .. }));
    }

    #[test]
    fn test_discover_cpus() {
        let root = scratch_dir("discover");
        for cpu in ["0", "2", "10"] {
            fs::create_dir_all(root.join(cpu)).unwrap();
            fs::write(root.join(cpu).join("msr"), b"").unwrap();
        }
        // Missing device node and non-numeric entries are ignored
        fs::create_dir_all(root.join("3")).unwrap();
        fs::create_dir_all(root.join("microcode")).unwrap();

        assert_eq!(discover_cpus(&root).unwrap(), vec![0, 2, 10]);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_discover_cpus_without_devices() {
        let root = scratch_dir("empty");
        assert!(matches!(
            discover_cpus(&root),
            Err(MsrError::NoDevices { .. })
        ));
        assert!(matches!(
            discover_cpus(&root.join("missing")),
            Err(MsrError::NoDevices { .. })
        ));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_msr_path() {
        assert_eq!(
            msr_path(Path::new(DEV_CPU_DIR), 4),
            PathBuf::from("/dev/cpu/4/msr")
        );
    }
}
