use std::{
    ptr::{self, null_mut},
    sync::atomic::Ordering,
};

use parking_lot::Mutex;

use super::region::Region;
use crate::heap::{QueueKind, RegionQueue};

/// Lock protected list of regions.
///
/// A region's queue pointer is only changed while the owning queue's lock is
/// held, so [`FreeQueue::try_remove`] doubles as the claim on the region.
pub struct FreeQueue {
    kind: QueueKind,
    regions: Mutex<Vec<*const Region>>,
}

unsafe impl Send for FreeQueue {}
unsafe impl Sync for FreeQueue {}

impl FreeQueue {
    pub fn new(kind: QueueKind) -> Self {
        Self {
            kind,
            regions: Mutex::new(Vec::new()),
        }
    }

    fn as_ptr(&self) -> *mut FreeQueue {
        self as *const Self as *mut Self
    }

    /// Links `region` into this queue. The region must not be linked anywhere.
    pub fn push(&self, region: &Region) {
        let mut regions = self.regions.lock();
        let prev = region.queue.swap(self.as_ptr(), Ordering::AcqRel);
        debug_assert!(prev.is_null(), "region is already linked in a queue");
        regions.push(region);
    }

    /// Unlinks and returns the first region accepted by `filter`.
    pub fn pop_where(&self, mut filter: impl FnMut(&Region) -> bool) -> Option<*const Region> {
        let mut regions = self.regions.lock();
        let pos = regions
            .iter()
            .rposition(|region| unsafe { filter(&**region) })?;
        let region = regions.swap_remove(pos);
        unsafe {
            (*region).queue.store(null_mut(), Ordering::Release);
        }
        Some(region)
    }

    pub fn contains(&self, region: &Region) -> bool {
        let _regions = self.regions.lock();
        region.queue.load(Ordering::Acquire) == self.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.regions.lock().len()
    }
}

impl RegionQueue<Region> for FreeQueue {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn try_remove(&self, region: &Region) -> bool {
        let mut regions = self.regions.lock();
        if region.queue.load(Ordering::Acquire) != self.as_ptr() {
            return false;
        }
        if let Some(pos) = regions.iter().position(|r| ptr::eq(*r, region)) {
            regions.swap_remove(pos);
        }
        region.queue.store(null_mut(), Ordering::Release);
        true
    }
}
