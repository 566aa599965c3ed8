use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zenstate_raw::{MsrError, DEV_CPU_DIR};

use crate::common::affinity::AffinityGuard;

pub type TransportResult<T> = std::result::Result<T, MsrError>;

/// Destination of a register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    /// A single logical CPU
    Cpu(u32),
    /// Every discovered CPU, in ascending order
    All,
}

/// Per-CPU 64-bit register access
///
/// Broadcast writes are issued CPU by CPU and stop at the first failure, so
/// a failed broadcast can leave the earlier CPUs updated.
pub trait RegisterTransport {
    /// Discovered CPU indices, ascending
    fn cpus(&self) -> &[u32];

    fn read(&self, cpu: u32, address: u32) -> TransportResult<u64>;

    fn write_cpu(&self, cpu: u32, address: u32, value: u64) -> TransportResult<()>;

    fn write(&self, target: WriteTarget, address: u32, value: u64) -> TransportResult<()> {
        match target {
            WriteTarget::Cpu(cpu) => self.write_cpu(cpu, address, value),
            WriteTarget::All => {
                for &cpu in self.cpus() {
                    self.write_cpu(cpu, address, value)?;
                }
                Ok(())
            }
        }
    }

    /// CPU whose registers stand in for the whole processor
    fn primary_cpu(&self) -> u32 {
        self.cpus().first().copied().unwrap_or(0)
    }
}

pub struct MsrHandle {
    file: Mutex<File>,
    cpu_id: u32,
}

impl MsrHandle {
    pub fn new(root: &Path, cpu: u32) -> TransportResult<Self> {
        let file = zenstate_raw::open_msr(root, cpu)?;

        tracing::debug!("Opened MSR handle {} for core {}", file.as_raw_fd(), cpu);

        Ok(Self {
            file: Mutex::new(file),
            cpu_id: cpu,
        })
    }

    // The msr driver forwards to the right CPU on its own; pinning only
    // keeps the access local, so failing to pin is not an error.
    fn pin(&self) -> Option<AffinityGuard> {
        AffinityGuard::pin(self.cpu_id)
            .map_err(|e| tracing::trace!("Not pinned to CPU {}: {}", self.cpu_id, e))
            .ok()
    }

    pub fn read(&self, addr: u32) -> TransportResult<u64> {
        let _affinity = self.pin();
        let mut file = self.file.lock();

        let value = zenstate_raw::read_from(&mut *file, self.cpu_id, addr)?;
        tracing::debug!(
            "MSR read: CPU {} MSR 0x{:08x} = 0x{:016x}",
            self.cpu_id,
            addr,
            value
        );
        Ok(value)
    }

    pub fn write(&self, addr: u32, value: u64) -> TransportResult<()> {
        let _affinity = self.pin();
        let mut file = self.file.lock();

        zenstate_raw::write_to(&mut *file, self.cpu_id, addr, value)?;
        tracing::debug!(
            "MSR write: CPU {} MSR 0x{:08x} = 0x{:016x}",
            self.cpu_id,
            addr,
            value
        );
        Ok(())
    }
}

/// Register transport backed by the Linux `msr` driver
///
/// CPUs are discovered once at construction; device files are opened lazily
/// and kept open for the lifetime of the transport.
pub struct MsrTransport {
    root: PathBuf,
    cpus: Vec<u32>,
    handles: RwLock<HashMap<u32, Arc<MsrHandle>>>,
}

impl MsrTransport {
    /// Discover CPUs under `/dev/cpu`
    pub fn open() -> TransportResult<Self> {
        Self::with_root(DEV_CPU_DIR)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> TransportResult<Self> {
        let root = root.into();
        let cpus = zenstate_raw::discover_cpus(&root)?;
        tracing::debug!("Discovered {} CPUs with MSR devices", cpus.len());

        Ok(Self {
            root,
            cpus,
            handles: RwLock::new(HashMap::new()),
        })
    }

    fn get_handle(&self, cpu: u32) -> TransportResult<Arc<MsrHandle>> {
        if self.cpus.binary_search(&cpu).is_err() {
            return Err(MsrError::UnknownCpu { cpu });
        }

        {
            let handles = self.handles.read();
            if let Some(handle) = handles.get(&cpu) {
                return Ok(Arc::clone(handle));
            }
        }

        let mut handles = self.handles.write();
        if let Some(handle) = handles.get(&cpu) {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(MsrHandle::new(&self.root, cpu)?);
        handles.insert(cpu, Arc::clone(&handle));
        Ok(handle)
    }
}

impl RegisterTransport for MsrTransport {
    fn cpus(&self) -> &[u32] {
        &self.cpus
    }

    fn read(&self, cpu: u32, address: u32) -> TransportResult<u64> {
        self.get_handle(cpu)?.read(address)
    }

    fn write_cpu(&self, cpu: u32, address: u32, value: u64) -> TransportResult<()> {
        self.get_handle(cpu)?.write(address, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fake `/dev/cpu` tree with regular files standing in for MSR devices
    fn fake_dev_cpu(name: &str, cpus: &[u32]) -> PathBuf {
        let root = std::env::temp_dir().join(format!("zenstate-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        for cpu in cpus {
            fs::create_dir_all(root.join(cpu.to_string())).unwrap();
            fs::write(root.join(cpu.to_string()).join("msr"), vec![0u8; 64]).unwrap();
        }
        root
    }

    #[test]
    fn test_transport_round_trip_on_file_tree() {
        let root = fake_dev_cpu("roundtrip", &[0, 1]);
        let transport = MsrTransport::with_root(&root).unwrap();

        assert_eq!(transport.cpus(), &[0, 1]);
        transport.write(WriteTarget::All, 0x10, 0xABCD).unwrap();
        assert_eq!(transport.read(0, 0x10).unwrap(), 0xABCD);
        assert_eq!(transport.read(1, 0x10).unwrap(), 0xABCD);

        transport.write(WriteTarget::Cpu(1), 0x18, 0x1).unwrap();
        assert_eq!(transport.read(0, 0x18).unwrap(), 0x0);
        assert_eq!(transport.read(1, 0x18).unwrap(), 0x1);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_unknown_cpu_is_rejected() {
        let root = fake_dev_cpu("unknown", &[0]);
        let transport = MsrTransport::with_root(&root).unwrap();

        assert!(matches!(
            transport.read(7, 0x10),
            Err(MsrError::UnknownCpu { cpu: 7 })
        ));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_tree_reports_no_devices() {
        let result = MsrTransport::with_root("/nonexistent/zenstate/dev/cpu");
        assert!(matches!(result, Err(MsrError::NoDevices { .. })));
    }

    #[test]
    fn test_primary_cpu_is_lowest() {
        let root = fake_dev_cpu("primary", &[3, 2]);
        let transport = MsrTransport::with_root(&root).unwrap();
        assert_eq!(transport.primary_cpu(), 2);
        fs::remove_dir_all(&root).unwrap();
    }
}
