//! Simple, volatile, in-memory implementations of [`KVStore`].

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use chat_moderation::store::pluggables::{KVGet, KVStore, KVWriteError, WriteBatch};

/// An in-memory implementation of [`KVStore`].
#[derive(Clone)]
pub(crate) struct MemDB(Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>);

impl MemDB {
    /// Create a new, empty `MemDB`.
    pub(crate) fn new() -> MemDB {
        MemDB(Arc::new(Mutex::new(HashMap::new())))
    }

    /// Set `key` to `value` directly, bypassing the chat app. Used to plant corrupted values.
    pub(crate) fn set_raw(&self, key: &[u8], value: &[u8]) {
        self.0.lock().unwrap().insert(key.to_vec(), value.to_vec());
    }

    /// Get the number of keys currently stored.
    pub(crate) fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl KVStore for MemDB {
    type WriteBatch = MemWriteBatch;

    fn write(&mut self, wb: Self::WriteBatch) -> Result<(), KVWriteError> {
        let mut map = self.0.lock().unwrap();
        for (key, value) in wb.insertions {
            map.insert(key, value);
        }
        Ok(())
    }
}

impl KVGet for MemDB {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.lock().unwrap().get(key).cloned()
    }
}

// A simple implementation of [`WriteBatch`].
pub(crate) struct MemWriteBatch {
    insertions: HashMap<Vec<u8>, Vec<u8>>,
}

impl WriteBatch for MemWriteBatch {
    fn new() -> Self {
        MemWriteBatch {
            insertions: HashMap::new(),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.insertions.insert(key.to_vec(), value.to_vec());
    }
}

/// A [`MemDB`] whose writes can be made to fail, leaving its contents untouched.
#[derive(Clone)]
pub(crate) struct FailingDB {
    inner: MemDB,
    fail_writes: Arc<AtomicBool>,
}

impl FailingDB {
    pub(crate) fn new() -> FailingDB {
        FailingDB {
            inner: MemDB::new(),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KVStore for FailingDB {
    type WriteBatch = MemWriteBatch;

    fn write(&mut self, wb: Self::WriteBatch) -> Result<(), KVWriteError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KVWriteError::new("disk full"));
        }
        self.inner.write(wb)
    }
}

impl KVGet for FailingDB {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }
}
