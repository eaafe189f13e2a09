//! Background trimmer for region based garbage collected heaps.
//!
//! The trimmer is a detached thread that walks the pages of a heap, merges
//! adjacent free regions and gives the memory behind free regions back to the
//! OS. It stays out of the way of the application and of the collector:
//!
//! - a full pass starts at most once per `retrim_interval` and only after a gen2
//!   collection happened since the previous pass,
//! - pages, region work and gen1 collections are paced with short sleeps,
//! - the collector stops it around blocking collections with
//!   [`Trimmer::set_stop_suggested`] / [`Trimmer::wait_for_stop`] and lets it go
//!   again with [`Trimmer::set_ok_to_run`].
//!
//! ```no_run
//! use comet_trim::{Generation, HeapConfig, RegionHeap, TrimConfig};
//!
//! let (heap, trimmer) =
//!     RegionHeap::with_trimmer(&HeapConfig::default(), TrimConfig::default()).unwrap();
//!
//! let region = heap.allocate(4).unwrap();
//! heap.free(region);
//!
//! // a blocking gen2 collection
//! {
//!     let _stopped = trimmer.suspend();
//!     heap.note_collection(Generation::Gen2);
//! }
//! ```
pub mod config;
pub mod error;
pub mod globals;
pub mod heap;
pub mod internal;
pub mod mmap;
pub mod region_heap;
pub mod statistics;
pub mod trimmer;

pub use config::{HeapConfig, TrimConfig};
pub use error::TrimError;
pub use heap::{
    CollectionCounter, Generation, HeapPage, HeapRegion, QueueKind, RegionAllocator, RegionQueue,
    TrimHeap,
};
pub use region_heap::RegionHeap;
pub use statistics::TrimStatisticsSnapshot;
pub use trimmer::{Trimmer, TrimmerPause, TrimmerState};
