use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};

use super::{page::Page, queue::FreeQueue};
use crate::heap::{HeapRegion, QueueKind, RegionQueue};

/// A run of granules inside a page.
///
/// Every granule of a page has a `Region` header, but only the first granule of
/// a run has a non-zero span. Headers inside a run are absorbed and skipped by
/// page iteration.
pub struct Region {
    index: usize,
    span: AtomicUsize,
    committed: AtomicBool,
    pub(super) queue: AtomicPtr<FreeQueue>,
    page: *const Page,
}

unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
    pub(super) fn new(page: *const Page, index: usize, span: usize, committed: bool) -> Self {
        Self {
            index,
            span: AtomicUsize::new(span),
            committed: AtomicBool::new(committed),
            queue: AtomicPtr::new(std::ptr::null_mut()),
            page,
        }
    }

    #[inline]
    fn page(&self) -> &Page {
        unsafe { &*self.page }
    }

    /// Index of the first granule of this region within its page.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn page_index(&self) -> usize {
        self.page().index()
    }

    /// Number of granules in this region, 0 if the header was absorbed by the
    /// region in front of it.
    pub fn span(&self) -> usize {
        self.span.load(Ordering::Acquire)
    }

    pub(super) fn set_span(&self, span: usize) {
        self.span.store(span, Ordering::Release);
    }

    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    pub(super) fn set_committed(&self, committed: bool) {
        self.committed.store(committed, Ordering::Release);
    }

    pub fn start(&self) -> *mut u8 {
        unsafe {
            self.page()
                .start()
                .add(self.index * self.page().granule_size())
        }
    }

    pub fn end(&self) -> *mut u8 {
        unsafe { self.start().add(self.size()) }
    }

    /// Region that starts right after this one in the same page.
    pub fn next(&self) -> Option<&Region> {
        let span = self.span();
        if span == 0 {
            return None;
        }
        self.page().region_at(self.index + span)
    }

    pub fn is_linked(&self) -> bool {
        !self.queue.load(Ordering::Acquire).is_null()
    }

    /// Makes the memory of this region usable again after a decommit.
    pub(super) fn commit(&self) -> bool {
        if self.is_committed() {
            return true;
        }
        if self.page().mmap().commit(self.start(), self.size()) {
            self.set_committed(true);
            return true;
        }
        false
    }
}

impl HeapRegion for Region {
    type Queue = FreeQueue;

    fn size(&self) -> usize {
        self.span() * self.page().granule_size()
    }

    fn containing_queue(&self) -> Option<&FreeQueue> {
        unsafe { self.queue.load(Ordering::Acquire).as_ref() }
    }

    fn can_decommit(&self) -> bool {
        self.span() != 0 && self.is_committed()
    }

    fn can_coalesce_with_next(&self) -> bool {
        self.next()
            .and_then(|next| next.containing_queue())
            .map_or(false, |queue| queue.kind() == QueueKind::Allocator)
    }

    fn try_coalesce_with_next(&self) -> bool {
        debug_assert!(!self.is_linked(), "coalescing a region that is still linked");
        let next = match self.next() {
            Some(next) => next,
            None => return false,
        };
        let queue = match next.containing_queue() {
            Some(queue) if queue.kind() == QueueKind::Allocator => queue,
            _ => return false,
        };
        if !queue.try_remove(next) {
            return false;
        }

        // the commit flag covers the whole span, so a mixed merge is recorded
        // as decommitted and commit() backs all of it again on reuse
        if self.is_committed() != next.is_committed() {
            let (start, size) = if self.is_committed() {
                (self.start(), self.size())
            } else {
                (next.start(), next.size())
            };
            if self.page().mmap().decommit(start, size) {
                log::trace!("released {} bytes of mixed merge", size);
            }
        }
        let next_span = next.span();
        let committed = self.is_committed() && next.is_committed();
        next.set_span(0);
        next.set_committed(false);
        self.set_committed(committed);
        self.set_span(self.span() + next_span);
        log::trace!(
            "coalesced region {}:{} with {}:{} ({} granules)",
            self.page_index(),
            self.index,
            next.page_index(),
            next.index,
            self.span()
        );
        true
    }

    fn try_decommit(&self) -> bool {
        debug_assert!(!self.is_linked(), "decommitting a region that is still linked");
        if !self.can_decommit() {
            return false;
        }
        if !self.page().mmap().decommit(self.start(), self.size()) {
            return false;
        }
        self.set_committed(false);
        log::trace!(
            "decommitted region {}:{} ({} bytes)",
            self.page_index(),
            self.index,
            self.size()
        );
        true
    }
}
