// src/counter.rs

use std::sync::atomic::{AtomicU64, Ordering};

/// The process-local counter.
///
/// Each instance owns its own value; nothing here is shared across processes.
#[derive(Debug, Default)]
pub struct CounterStore {
    value: AtomicU64,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Add one and return the new value
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Set to zero and return zero
    pub fn reset(&self) -> u64 {
        self.value.store(0, Ordering::SeqCst);
        0
    }
}
