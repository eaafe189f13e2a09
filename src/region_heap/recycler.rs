use std::sync::atomic::{AtomicU64, Ordering};

use super::queue::FreeQueue;
use crate::heap::{CollectionCounter, Generation, QueueKind};

/// Collection bookkeeping of the heap.
pub struct Recycler {
    collections: [AtomicU64; 3],
    working: Box<FreeQueue>,
}

impl Recycler {
    pub fn new() -> Self {
        Self {
            collections: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            working: Box::new(FreeQueue::new(QueueKind::Recycler)),
        }
    }

    /// Records a finished collection. Collecting a generation also collects
    /// every younger one.
    pub fn note_collection(&self, generation: Generation) {
        for g in 0..=generation.index() {
            self.collections[g].fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Regions the collector currently owns.
    pub fn working_queue(&self) -> &FreeQueue {
        &self.working
    }
}

impl Default for Recycler {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionCounter for Recycler {
    fn collection_count(&self, generation: Generation) -> u64 {
        self.collections[generation.index()].load(Ordering::Acquire)
    }
}
