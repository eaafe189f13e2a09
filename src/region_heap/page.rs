use super::region::Region;
use crate::{error::TrimError, heap::HeapPage, mmap::Mmap};

/// A reserved chunk of address space split into equally sized granules.
pub struct Page {
    index: usize,
    granule_size: usize,
    mmap: Mmap,
    regions: Box<[Region]>,
}

impl Page {
    /// Reserves a page whose memory is one committed region spanning all
    /// granules. The region is not linked in any queue yet.
    pub fn create(index: usize, granules: usize, granule_size: usize) -> Result<Box<Self>, TrimError> {
        assert!(granules > 0, "page without granules");
        let mmap = Mmap::new(granules * granule_size)?;
        let mut page = Box::new(Self {
            index,
            granule_size,
            mmap,
            regions: Box::new([]),
        });
        let raw = &*page as *const Page;
        page.regions = (0..granules)
            .map(|i| {
                let span = if i == 0 { granules } else { 0 };
                Region::new(raw, i, span, i == 0)
            })
            .collect();
        Ok(page)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn granule_size(&self) -> usize {
        self.granule_size
    }

    pub fn granules(&self) -> usize {
        self.regions.len()
    }

    pub fn start(&self) -> *mut u8 {
        self.mmap.start()
    }

    pub fn end(&self) -> *mut u8 {
        self.mmap.end()
    }

    pub(super) fn mmap(&self) -> &Mmap {
        &self.mmap
    }

    pub fn region_at(&self, granule: usize) -> Option<&Region> {
        self.regions.get(granule)
    }

    pub fn first_region(&self) -> &Region {
        &self.regions[0]
    }

    pub fn committed_bytes(&self) -> usize {
        let mut bytes = 0;
        self.for_each_region(&mut |region| {
            if region.is_committed() {
                bytes += region.span() * self.granule_size;
            }
        });
        bytes
    }
}

impl HeapPage for Page {
    type Region = Region;

    fn for_each_region(&self, visitor: &mut dyn FnMut(&Region)) {
        let mut granule = 0;
        while granule < self.regions.len() {
            let region = &self.regions[granule];
            if region.span() == 0 {
                granule += 1;
                continue;
            }
            visitor(region);
            // the visitor may have coalesced the region, so read the span again
            granule += region.span().max(1);
        }
    }
}
