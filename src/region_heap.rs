//! Region heap the trimmer runs against.
//!
//! Each page reserves `regions_per_page * granule_size` bytes and starts out as
//! one committed free region. Allocation splits free regions; the trimmer merges
//! them back and gives their memory to the OS.
pub mod allocator;
pub mod page;
pub mod queue;
pub mod recycler;
pub mod region;

use std::sync::Arc;

pub use allocator::Allocator;
pub use page::Page;
pub use queue::FreeQueue;
pub use recycler::Recycler;
pub use region::Region;

use crate::{
    config::{HeapConfig, TrimConfig},
    error::TrimError,
    heap::{Generation, TrimHeap},
    trimmer::Trimmer,
};

pub struct RegionHeap {
    config: HeapConfig,
    pages: Vec<Box<Page>>,
    allocator: Allocator,
    recycler: Recycler,
}

impl RegionHeap {
    pub fn new(config: &HeapConfig) -> Result<Self, TrimError> {
        let allocator = Allocator::new();
        let pages = (0..config.page_count)
            .map(|index| Page::create(index, config.regions_per_page, config.granule_size))
            .collect::<Result<Vec<_>, _>>()?;
        for page in pages.iter() {
            allocator.free(page.first_region());
        }

        Ok(Self {
            config: *config,
            pages,
            allocator,
            recycler: Recycler::new(),
        })
    }

    /// Creates a heap together with its trimmer.
    pub fn with_trimmer(
        heap_config: &HeapConfig,
        trim_config: TrimConfig,
    ) -> Result<(Arc<Self>, Arc<Trimmer<Self>>), TrimError> {
        let heap = Arc::new(Self::new(heap_config)?);
        let trimmer = Trimmer::new(heap.clone(), trim_config)?;
        Ok((heap, trimmer))
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn pages(&self) -> &[Box<Page>] {
        &self.pages
    }

    /// Allocates a committed region of `granules` granules.
    pub fn allocate(&self, granules: usize) -> Option<&Region> {
        self.allocator.allocate(granules)
    }

    pub fn free(&self, region: &Region) {
        self.allocator.free(region);
    }

    pub fn note_collection(&self, generation: Generation) {
        self.recycler.note_collection(generation);
    }

    pub fn committed_bytes(&self) -> usize {
        self.pages.iter().map(|page| page.committed_bytes()).sum()
    }

    pub fn reserved_bytes(&self) -> usize {
        self.config.page_count * self.config.page_size()
    }
}

impl TrimHeap for RegionHeap {
    type Region = Region;
    type Page = Page;
    type Allocator = Allocator;
    type Recycler = Recycler;

    fn for_each_page(&self, visitor: &mut dyn FnMut(&Page)) {
        for page in self.pages.iter() {
            visitor(page);
        }
    }

    fn recycler(&self) -> &Recycler {
        &self.recycler
    }

    fn allocator(&self) -> &Allocator {
        &self.allocator
    }
}
