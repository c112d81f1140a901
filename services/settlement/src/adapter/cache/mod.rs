mod in_mem;

use std::boxed::Box;
use std::marker::{Send, Sync};
use std::result::Result;

use async_trait::async_trait;

use in_mem::InMemBookingSyncLockCache;

pub struct BookingSyncLockError;

#[async_trait]
pub trait AbstractBookingSyncLockCache: Send + Sync {
    async fn acquire(&self, usr_id: u32, booking_id: &str) -> Result<bool, BookingSyncLockError>;

    async fn release(&self, usr_id: u32, booking_id: &str) -> Result<(), BookingSyncLockError>;
}

// TODO, pass config object that allows users to switch between
// different caches e.g. Redis in the future
pub fn app_cache_booking_sync_lock() -> Box<dyn AbstractBookingSyncLockCache> {
    let cch = InMemBookingSyncLockCache::default();
    Box::new(cch)
}
