use parking_lot::{Mutex, MutexGuard};

use crate::codec::RecordType;

/// One mutex per record type, serializing reconcile-and-write sequences within this process.
///
/// Build it once at startup and hand it to every engine by reference. Cross-process
/// writers are only kept apart by the API's own conflict responses.
#[derive(Debug)]
pub struct LockRegistry {
    locks: Vec<Mutex<()>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry {
            locks: RecordType::ALL.iter().map(|_| Mutex::new(())).collect(),
        }
    }

    /// Blocks until the lock for `record_type` is free.
    pub fn lock(&self, record_type: RecordType) -> MutexGuard<'_, ()> {
        // ALL lists the variants in declaration order
        self.locks[record_type as usize].lock()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
