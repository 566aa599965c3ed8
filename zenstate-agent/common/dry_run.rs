use parking_lot::Mutex;

use crate::common::msr::{RegisterTransport, TransportResult};

/// A register write that was withheld from hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedWrite {
    pub cpu: u32,
    pub address: u32,
    pub value: u64,
}

/// Transport that reads through to `T` but never writes
///
/// Withheld writes are recorded in order. Later reads of the same register
/// on the same CPU observe the recorded value, so a sequence of edits
/// behaves as it would on hardware.
pub struct DryRunTransport<T> {
    inner: T,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl<T: RegisterTransport> DryRunTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Writes withheld so far, oldest first
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().clone()
    }
}

impl<T: RegisterTransport> RegisterTransport for DryRunTransport<T> {
    fn cpus(&self) -> &[u32] {
        self.inner.cpus()
    }

    fn read(&self, cpu: u32, address: u32) -> TransportResult<u64> {
        let pending = self
            .writes
            .lock()
            .iter()
            .rev()
            .find(|w| w.cpu == cpu && w.address == address)
            .map(|w| w.value);

        match pending {
            Some(value) => Ok(value),
            None => self.inner.read(cpu, address),
        }
    }

    fn write_cpu(&self, cpu: u32, address: u32, value: u64) -> TransportResult<()> {
        tracing::debug!("Dry run: CPU {cpu} MSR 0x{address:08x} <- 0x{value:016x}");
        self.writes.lock().push(RecordedWrite {
            cpu,
            address,
            value,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory::MemoryTransport;
    use crate::common::msr::WriteTarget;

    #[test]
    fn test_writes_are_recorded_not_forwarded() {
        let bank = MemoryTransport::new(&[0, 1]);
        bank.set(0, 0x10, 0x5);
        let dry = DryRunTransport::new(bank);

        dry.write(WriteTarget::All, 0x10, 0x7).unwrap();

        assert_eq!(dry.writes().len(), 2);
        assert_eq!(dry.inner.get(0, 0x10), 0x5);
        assert!(dry.inner.writes().is_empty());
    }

    #[test]
    fn test_reads_observe_recorded_writes() {
        let bank = MemoryTransport::new(&[0, 1]);
        bank.set(0, 0x10, 0x5);
        bank.set(1, 0x10, 0x5);
        let dry = DryRunTransport::new(bank);

        dry.write(WriteTarget::Cpu(1), 0x10, 0x9).unwrap();

        assert_eq!(dry.read(0, 0x10).unwrap(), 0x5);
        assert_eq!(dry.read(1, 0x10).unwrap(), 0x9);
    }
}
