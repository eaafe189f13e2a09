use std::time::Duration;

/// Minimum time between two full trimming passes. A pass additionally requires
/// that a gen2 collection happened since the previous one.
pub const RETRIM_INTERVAL: Duration = Duration::from_millis(5000);
/// At most one page is inspected per this interval.
pub const PAGE_SCAN_INTERVAL: Duration = Duration::from_millis(1);
/// At most one region is decommitted or coalesced per this interval.
pub const REGION_WORK_INTERVAL: Duration = Duration::from_millis(10);
/// Back-off applied when a gen1 collection is observed in the middle of a page.
pub const COLLECTION_BACKOFF: Duration = Duration::from_millis(1000);
/// Poll interval of a stopped trimmer before it parks itself.
pub const STOPPED_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const STOPPED_POLL_COUNT: usize = 10;

pub const REGION_GRANULE_SIZE: usize = 256 * 1024;
pub const REGIONS_PER_PAGE: usize = 64;
pub const PAGE_SIZE: usize = REGION_GRANULE_SIZE * REGIONS_PER_PAGE;

pub const TRIMMER_THREAD_NAME: &str = "comet-gc-trimmer";
