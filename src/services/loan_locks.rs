//! Per-loan exclusive locks
//!
//! Serialises the price-then-write sequence for one loan while leaving
//! unrelated loans free to be paid concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct LoanLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl LoanLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `loan_id`; released when the guard drops
    pub async fn acquire(&self, loan_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // entries only the map still references are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(loan_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of loans with a lock currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
