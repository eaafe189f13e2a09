use super::{queue::FreeQueue, region::Region};
use crate::heap::{QueueKind, RegionAllocator};

/// Free region pools. Committed and decommitted regions are kept apart so that
/// allocation prefers memory that is already backed.
pub struct Allocator {
    committed: Box<FreeQueue>,
    decommitted: Box<FreeQueue>,
}

impl Allocator {
    pub fn new() -> Self {
        Self {
            committed: Box::new(FreeQueue::new(QueueKind::Allocator)),
            decommitted: Box::new(FreeQueue::new(QueueKind::Allocator)),
        }
    }

    pub fn committed_queue(&self) -> &FreeQueue {
        &self.committed
    }

    pub fn decommitted_queue(&self) -> &FreeQueue {
        &self.decommitted
    }

    fn queue_for(&self, region: &Region) -> &FreeQueue {
        if region.is_committed() {
            &self.committed
        } else {
            &self.decommitted
        }
    }

    /// Takes a free region of at least `granules` granules, splits off the
    /// rest and makes sure the returned region is committed. The returned region
    /// is not linked in any queue.
    pub fn allocate(&self, granules: usize) -> Option<&Region> {
        assert!(granules > 0, "empty allocation");
        let region = self
            .committed
            .pop_where(|region| region.span() >= granules)
            .or_else(|| {
                self.decommitted
                    .pop_where(|region| region.span() >= granules)
            })?;
        let region = unsafe { &*region };

        let total = region.span();
        if total > granules {
            region.set_span(granules);
            if let Some(tail) = region.next() {
                tail.set_span(total - granules);
                tail.set_committed(region.is_committed());
                self.queue_for(tail).push(tail);
            }
        }

        if !region.commit() {
            self.free(region);
            return None;
        }
        Some(region)
    }

    pub fn free(&self, region: &Region) {
        debug_assert!(region.span() != 0);
        self.queue_for(region).push(region);
    }

    pub fn free_regions(&self) -> usize {
        self.committed.len() + self.decommitted.len()
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionAllocator<Region> for Allocator {
    fn add_region(&self, region: &Region) {
        debug_assert!(!region.is_committed());
        self.free(region);
    }

    fn return_region(&self, region: &Region) {
        self.free(region);
    }
}
