use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use atomic::Atomic;
use crossbeam_utils::{Backoff, CachePadded};
use parking_lot::Mutex;

use crate::{
    config::TrimConfig,
    error::TrimError,
    globals::TRIMMER_THREAD_NAME,
    heap::{
        CollectionCounter, Generation, HeapPage, HeapRegion, QueueKind, RegionAllocator,
        RegionQueue, TrimHeap,
    },
    internal::{event::ParkEvent, gate::SleepGate},
    statistics::{TrimStatistics, TrimStatisticsSnapshot},
};

/// State of the trimmer. The order of the variants matters: everything above
/// `Stopped` counts as active.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum TrimmerState {
    /// Parked on the event. Only [`Trimmer::set_ok_to_run`] gets it out of here.
    Blocked = 0,
    /// Idle. The trimmer polls for a state change for a while and then parks.
    Stopped = 1,
    /// Somebody asked the trimmer to stop, the trimmer has not noticed yet.
    StopSuggested = 2,
    /// Permission to run was granted, the trimmer has not noticed yet.
    OkToRun = 3,
    /// Scanning and trimming.
    Running = 4,
}

/// Background thread that decommits and coalesces free regions of a heap.
///
/// The collector brackets every blocking collection with
/// [`Trimmer::set_stop_suggested`] + [`Trimmer::wait_for_stop`] and
/// [`Trimmer::set_ok_to_run`] (or uses [`Trimmer::suspend`]). The trimmer only
/// makes progress between collections and only after at least one gen2
/// collection happened since its previous pass.
pub struct Trimmer<H: TrimHeap> {
    heap: Arc<H>,
    state: CachePadded<Atomic<TrimmerState>>,
    paused: AtomicBool,
    last_gen2_count: AtomicU64,
    sleep_gate: SleepGate,
    event: ParkEvent,
    /// Number of live [`TrimmerPause`] guards.
    suspensions: Mutex<usize>,
    config: TrimConfig,
    stats: TrimStatistics,
}

impl<H: TrimHeap> Trimmer<H> {
    /// Creates the trimmer for `heap` and, if trimming is enabled, starts its
    /// thread. The thread is detached and runs for the rest of the process.
    pub fn new(heap: Arc<H>, config: TrimConfig) -> Result<Arc<Self>, TrimError> {
        let this = Arc::new(Self {
            heap,
            state: CachePadded::new(Atomic::new(TrimmerState::Stopped)),
            paused: AtomicBool::new(false),
            last_gen2_count: AtomicU64::new(0),
            sleep_gate: SleepGate::new(),
            event: ParkEvent::new(),
            suspensions: Mutex::new(0),
            config,
            stats: TrimStatistics::default(),
        });

        if config.enabled {
            let trimmer = this.clone();
            thread::Builder::new()
                .name(TRIMMER_THREAD_NAME.to_string())
                .spawn(move || trimmer.run())
                .map_err(TrimError::Spawn)?;
        }
        Ok(this)
    }

    pub fn heap(&self) -> &Arc<H> {
        &self.heap
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> TrimmerState {
        self.state.load(Ordering::Acquire)
    }

    /// True unless the trimmer is stopped or parked.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state() > TrimmerState::Stopped
    }

    pub fn statistics(&self) -> TrimStatisticsSnapshot {
        self.stats.snapshot()
    }

    pub fn last_gen2_count(&self) -> u64 {
        self.last_gen2_count.load(Ordering::Relaxed)
    }

    #[inline]
    fn transition(
        &self,
        from: TrimmerState,
        to: TrimmerState,
    ) -> Result<TrimmerState, TrimmerState> {
        let result = self
            .state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire);
        if result.is_ok() {
            log::trace!("trimmer {:?} -> {:?}", from, to);
        }
        result
    }

    /// Allows the trimmer to run. Callable from any thread.
    pub fn set_ok_to_run(&self) {
        let mut state = self.state();
        loop {
            let result = match state {
                TrimmerState::Blocked => {
                    // the trimmer cannot leave Blocked by itself, so whoever wins
                    // this exchange is the only one to signal the event
                    let result = self.transition(state, TrimmerState::OkToRun);
                    if result.is_ok() {
                        self.event.set();
                    }
                    result
                }
                TrimmerState::Stopped => self.transition(state, TrimmerState::OkToRun),
                TrimmerState::StopSuggested => self.transition(state, TrimmerState::Running),
                TrimmerState::OkToRun | TrimmerState::Running => return,
            };
            match result {
                Ok(_) => return,
                Err(actual) => state = actual,
            }
        }
    }

    /// Asks the trimmer to stop before its next unit of work. Callable from any
    /// thread; pair with [`Trimmer::wait_for_stop`] to wait for the
    /// acknowledgement.
    pub fn set_stop_suggested(&self) {
        loop {
            let state = self.state();
            match state {
                TrimmerState::OkToRun => {
                    if self.transition(state, TrimmerState::Stopped).is_ok() {
                        self.unpause();
                        return;
                    }
                }
                TrimmerState::Running => {
                    if self.transition(state, TrimmerState::StopSuggested).is_ok() {
                        self.unpause();
                        return;
                    }
                }
                TrimmerState::Blocked | TrimmerState::Stopped | TrimmerState::StopSuggested => {
                    self.unpause();
                    return;
                }
            }
        }
    }

    /// Blocks until the trimmer acknowledged a stop request issued by
    /// [`Trimmer::set_stop_suggested`].
    pub fn wait_for_stop(&self) {
        debug_assert!(self.state() <= TrimmerState::StopSuggested);

        let backoff = Backoff::new();
        while self.state() == TrimmerState::StopSuggested {
            if self.paused.load(Ordering::Acquire) {
                self.unpause();
            }
            backoff.snooze();
        }

        debug_assert!(!self.is_active());
    }

    /// Stops the trimmer and keeps it stopped until every guard returned by
    /// this method is dropped. Guards may overlap across threads; only the
    /// last one to go lets the trimmer run again.
    ///
    /// Direct [`Trimmer::set_ok_to_run`] calls are not counted and still resume
    /// the trimmer while guards are alive.
    pub fn suspend(&self) -> TrimmerPause<'_, H> {
        let mut suspensions = self.suspensions.lock();
        *suspensions += 1;
        if *suspensions == 1 {
            self.set_stop_suggested();
            self.wait_for_stop();
        }
        TrimmerPause { trimmer: self }
    }

    fn resume(&self) {
        let mut suspensions = self.suspensions.lock();
        debug_assert!(*suspensions > 0);
        *suspensions -= 1;
        if *suspensions == 0 {
            self.set_ok_to_run();
        }
    }

    fn pause(&self, duration: Duration) {
        self.paused.store(true, Ordering::Release);
        self.sleep_gate.timed_wait(duration);
        self.paused.store(false, Ordering::Release);
    }

    fn unpause(&self) {
        self.sleep_gate.wake_one();
    }

    /// Brings the trimmer thread in line with what other threads asked for.
    /// Returns once the state is `Running`.
    pub(crate) fn stop_and_wait(&self) {
        'dispatch: loop {
            let state = self.state();
            match state {
                TrimmerState::StopSuggested => {
                    let _ = self.transition(state, TrimmerState::Stopped);
                }
                TrimmerState::OkToRun => {
                    let _ = self.transition(state, TrimmerState::Running);
                }
                TrimmerState::Running => return,
                TrimmerState::Stopped => {
                    for _ in 0..self.config.stopped_poll_count {
                        self.pause(self.config.stopped_poll_interval);
                        if self.state() != state {
                            continue 'dispatch;
                        }
                    }

                    if self.transition(state, TrimmerState::Blocked).is_ok() {
                        self.park();
                    }
                }
                // parked by an earlier call that has not been released yet
                TrimmerState::Blocked => self.park(),
            }
        }
    }

    fn park(&self) {
        log::debug!("trimmer parked");
        TrimStatistics::bump(&self.stats.times_parked);
        self.event.wait();
        log::debug!("trimmer unparked in {:?}", self.state());
    }

    #[inline]
    fn checkpoint(&self) {
        if self.state() != TrimmerState::Running {
            self.stop_and_wait();
        }
    }

    fn collection_count(&self, generation: Generation) -> u64 {
        self.heap.recycler().collection_count(generation)
    }

    fn run(&self) {
        log::info!("trimmer thread started");
        self.last_gen2_count
            .store(self.collection_count(Generation::Gen2), Ordering::Relaxed);
        loop {
            self.wait_for_collection();
            self.trim_pass();
        }
    }

    /// Returns once a gen2 collection happened since the last pass, sleeping at
    /// least `retrim_interval` between checks.
    pub(crate) fn wait_for_collection(&self) {
        loop {
            let gen2 = self.collection_count(Generation::Gen2);
            if gen2 != self.last_gen2_count.load(Ordering::Relaxed) {
                self.last_gen2_count.store(gen2, Ordering::Relaxed);
                return;
            }

            let _ = self.transition(TrimmerState::Running, TrimmerState::Stopped);
            self.pause(self.config.retrim_interval);
            self.stop_and_wait();
        }
    }

    /// One walk over every page of the heap.
    pub(crate) fn trim_pass(&self) {
        TrimStatistics::bump(&self.stats.passes);
        let heap = &*self.heap;

        heap.for_each_page(&mut |page| {
            self.pause(self.config.page_interval);
            self.checkpoint();
            TrimStatistics::bump(&self.stats.pages_scanned);

            let mut last_gen1 = self.collection_count(Generation::Gen1);
            page.for_each_region(&mut |region| {
                self.trim_region(region);

                let gen1 = self.collection_count(Generation::Gen1);
                if gen1 != last_gen1 {
                    last_gen1 = gen1;
                    TrimStatistics::bump(&self.stats.collection_backoffs);
                    self.pause(self.config.collection_backoff);
                }
                self.checkpoint();
            });
        });

        let stats = self.stats.snapshot();
        if self.config.verbose {
            log::info!("trim pass {} done\n{}", stats.passes, stats);
        } else {
            log::debug!("trim pass {} done\n{}", stats.passes, stats);
        }
    }

    /// Coalesces and decommits `region` if it is a free allocator region.
    /// Returns true if any work was done.
    pub(crate) fn trim_region(&self, region: &H::Region) -> bool {
        let queue = match region.containing_queue() {
            Some(queue) if queue.kind() == QueueKind::Allocator => queue,
            _ => return false,
        };
        if !(region.can_decommit() || region.can_coalesce_with_next()) {
            return false;
        }
        if !queue.try_remove(region) {
            TrimStatistics::bump(&self.stats.removal_races_lost);
            return false;
        }
        TrimStatistics::bump(&self.stats.regions_claimed);

        let mut did_some_work = region.try_coalesce_with_next();
        if did_some_work {
            TrimStatistics::bump(&self.stats.regions_coalesced);
        }

        let size = region.size();
        if region.try_decommit() {
            self.heap.allocator().add_region(region);
            TrimStatistics::bump(&self.stats.regions_decommitted);
            self.stats
                .bytes_decommitted
                .fetch_add(size as u64, Ordering::Relaxed);
            did_some_work = true;
        } else {
            self.heap.allocator().return_region(region);
            TrimStatistics::bump(&self.stats.regions_returned);
        }

        if did_some_work {
            self.pause(self.config.region_work_interval);
            self.checkpoint();
        }
        did_some_work
    }

    #[cfg(test)]
    pub(crate) fn force_state(&self, state: TrimmerState) {
        self.state.store(state, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Keeps the trimmer stopped while alive, see [`Trimmer::suspend`].
#[must_use = "the trimmer resumes as soon as the guard is dropped"]
pub struct TrimmerPause<'a, H: TrimHeap> {
    trimmer: &'a Trimmer<H>,
}

impl<H: TrimHeap> Drop for TrimmerPause<'_, H> {
    fn drop(&mut self) {
        self.trimmer.resume();
    }
}
