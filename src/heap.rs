//! Narrow views of the heap that the trimmer works through.
//!
//! The trimmer never owns pages or regions. It walks them through
//! [`TrimHeap::for_each_page`] and [`HeapPage::for_each_region`], claims a
//! region by winning [`RegionQueue::try_remove`] and afterwards hands it back to
//! the [`RegionAllocator`].

/// GC generation a collection count is kept for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum Generation {
    Gen0 = 0,
    Gen1 = 1,
    Gen2 = 2,
}

impl Generation {
    pub const ALL: [Generation; 3] = [Generation::Gen0, Generation::Gen1, Generation::Gen2];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Owner kind of a region queue. Only regions linked in an `Allocator` queue are
/// trim candidates.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum QueueKind {
    /// Free regions owned by the allocator.
    Allocator,
    /// Regions the collector is currently working on.
    Recycler,
    /// Regions handed out to mutators for allocation.
    Reserve,
}

pub trait CollectionCounter {
    /// Number of completed collections of `generation`. Never decreases.
    fn collection_count(&self, generation: Generation) -> u64;
}

pub trait RegionQueue<R: ?Sized> {
    fn kind(&self) -> QueueKind;
    /// Unlinks `region` if it is still linked in this queue. Only the caller that
    /// got `true` may touch the region afterwards.
    fn try_remove(&self, region: &R) -> bool;
}

pub trait HeapRegion {
    type Queue: RegionQueue<Self>;

    /// Size of the region in bytes.
    fn size(&self) -> usize;
    fn containing_queue(&self) -> Option<&Self::Queue>;
    fn can_decommit(&self) -> bool;
    fn can_coalesce_with_next(&self) -> bool;
    /// Best effort merge with the region that follows this one.
    fn try_coalesce_with_next(&self) -> bool;
    fn try_decommit(&self) -> bool;
}

pub trait HeapPage {
    type Region: HeapRegion;

    fn for_each_region(&self, visitor: &mut dyn FnMut(&Self::Region));
}

pub trait RegionAllocator<R: ?Sized> {
    /// Takes a freshly decommitted region into the free pool.
    fn add_region(&self, region: &R);
    /// Takes back a region the trimmer could not decommit.
    fn return_region(&self, region: &R);
}

pub trait TrimHeap: Send + Sync + 'static {
    type Region: HeapRegion;
    type Page: HeapPage<Region = Self::Region>;
    type Allocator: RegionAllocator<Self::Region>;
    type Recycler: CollectionCounter;

    fn for_each_page(&self, visitor: &mut dyn FnMut(&Self::Page));
    fn recycler(&self) -> &Self::Recycler;
    fn allocator(&self) -> &Self::Allocator;
}
