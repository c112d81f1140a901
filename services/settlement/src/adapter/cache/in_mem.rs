use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AbstractBookingSyncLockCache, BookingSyncLockError};

// the lock set only guards bookings served by this process, a multi
// node deployment requires a shared cache behind the same trait
pub(super) struct InMemBookingSyncLockCache {
    held: Mutex<HashSet<(u32, String)>>,
}

impl Default for InMemBookingSyncLockCache {
    fn default() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl AbstractBookingSyncLockCache for InMemBookingSyncLockCache {
    async fn acquire(&self, usr_id: u32, booking_id: &str) -> Result<bool, BookingSyncLockError> {
        let mut guard = self.held.lock().await;
        let newly_added = guard.insert((usr_id, booking_id.to_string()));
        Ok(newly_added)
    }

    async fn release(&self, usr_id: u32, booking_id: &str) -> Result<(), BookingSyncLockError> {
        let mut guard = self.held.lock().await;
        guard.remove(&(usr_id, booking_id.to_string()));
        Ok(())
    }
}
