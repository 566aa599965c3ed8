//! In-memory register bank for exercising the orchestrator without hardware

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;

use zenstate_raw::MsrError;

use crate::common::msr::{RegisterTransport, TransportResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read { cpu: u32, address: u32 },
    Write { cpu: u32, address: u32, value: u64 },
}

/// Register bank keyed by (cpu, address); unset registers read as zero
pub struct MemoryTransport {
    cpus: Vec<u32>,
    registers: Mutex<HashMap<(u32, u32), u64>>,
    log: Mutex<Vec<Access>>,
    failing: Mutex<HashSet<(u32, u32)>>,
}

impl MemoryTransport {
    pub fn new(cpus: &[u32]) -> Self {
        Self {
            cpus: cpus.to_vec(),
            registers: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Seed `address` with `value` on every CPU
    pub fn set_all(&self, address: u32, value: u64) {
        for &cpu in &self.cpus {
            self.set(cpu, address, value);
        }
    }

    pub fn set(&self, cpu: u32, address: u32, value: u64) {
        self.registers.lock().insert((cpu, address), value);
    }

    pub fn get(&self, cpu: u32, address: u32) -> u64 {
        self.registers
            .lock()
            .get(&(cpu, address))
            .copied()
            .unwrap_or(0)
    }

    /// Make every access to `address` on `cpu` fail
    pub fn fail(&self, cpu: u32, address: u32) {
        self.failing.lock().insert((cpu, address));
    }

    pub fn log(&self) -> Vec<Access> {
        self.log.lock().clone()
    }

    pub fn writes(&self) -> Vec<(u32, u32, u64)> {
        self.log
            .lock()
            .iter()
            .filter_map(|access| match *access {
                Access::Write {
                    cpu,
                    address,
                    value,
                } => Some((cpu, address, value)),
                Access::Read { .. } => None,
            })
            .collect()
    }

    fn check(&self, cpu: u32, address: u32) -> TransportResult<()> {
        if !self.cpus.contains(&cpu) {
            return Err(MsrError::UnknownCpu { cpu });
        }
        if self.failing.lock().contains(&(cpu, address)) {
            return Err(MsrError::WriteFailed {
                cpu,
                msr: address,
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        Ok(())
    }
}

impl RegisterTransport for MemoryTransport {
    fn cpus(&self) -> &[u32] {
        &self.cpus
    }

    fn read(&self, cpu: u32, address: u32) -> TransportResult<u64> {
        self.check(cpu, address)?;
        self.log.lock().push(Access::Read { cpu, address });
        Ok(self.get(cpu, address))
    }

    fn write_cpu(&self, cpu: u32, address: u32, value: u64) -> TransportResult<()> {
        self.check(cpu, address)?;
        self.log.lock().push(Access::Write {
            cpu,
            address,
            value,
        });
        self.set(cpu, address, value);
        Ok(())
    }
}
