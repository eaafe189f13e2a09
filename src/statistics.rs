use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters of the trimmer. Updated only by the trimmer thread, read by
/// anyone.
#[derive(Default)]
pub struct TrimStatistics {
    pub(crate) passes: AtomicU64,
    pub(crate) pages_scanned: AtomicU64,
    pub(crate) regions_claimed: AtomicU64,
    pub(crate) removal_races_lost: AtomicU64,
    pub(crate) regions_coalesced: AtomicU64,
    pub(crate) regions_decommitted: AtomicU64,
    pub(crate) bytes_decommitted: AtomicU64,
    pub(crate) regions_returned: AtomicU64,
    pub(crate) collection_backoffs: AtomicU64,
    pub(crate) times_parked: AtomicU64,
}

impl TrimStatistics {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TrimStatisticsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        TrimStatisticsSnapshot {
            passes: load(&self.passes),
            pages_scanned: load(&self.pages_scanned),
            regions_claimed: load(&self.regions_claimed),
            removal_races_lost: load(&self.removal_races_lost),
            regions_coalesced: load(&self.regions_coalesced),
            regions_decommitted: load(&self.regions_decommitted),
            bytes_decommitted: load(&self.bytes_decommitted),
            regions_returned: load(&self.regions_returned),
            collection_backoffs: load(&self.collection_backoffs),
            times_parked: load(&self.times_parked),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrimStatisticsSnapshot {
    pub passes: u64,
    pub pages_scanned: u64,
    pub regions_claimed: u64,
    pub removal_races_lost: u64,
    pub regions_coalesced: u64,
    pub regions_decommitted: u64,
    pub bytes_decommitted: u64,
    /// Claimed regions that went back to the allocator still committed.
    pub regions_returned: u64,
    pub collection_backoffs: u64,
    pub times_parked: u64,
}

/// Renders a byte count with a binary unit suffix, e.g. `512B` or `1.5K`.
fn human_size(bytes: u64) -> String {
    const UNITS: [char; 3] = ['K', 'M', 'G'];
    if bytes < 1024 {
        return format!("{}B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

impl std::fmt::Display for TrimStatisticsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Trimmer statistics:")?;
        writeln!(f, "  Passes: {}", self.passes)?;
        writeln!(f, "  Pages scanned: {}", self.pages_scanned)?;
        writeln!(
            f,
            "  Regions claimed: {} (lost races: {})",
            self.regions_claimed, self.removal_races_lost
        )?;
        writeln!(f, "  Regions coalesced: {}", self.regions_coalesced)?;
        writeln!(
            f,
            "  Regions decommitted: {} ({})",
            self.regions_decommitted,
            human_size(self.bytes_decommitted)
        )?;
        writeln!(
            f,
            "  Regions returned committed: {}",
            self.regions_returned
        )?;
        writeln!(f, "  Collection back-offs: {}", self.collection_backoffs)?;
        writeln!(f, "  Times parked: {}", self.times_parked)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_formats_sizes() {
        let stats = TrimStatistics::default();
        TrimStatistics::bump(&stats.passes);
        stats
            .bytes_decommitted
            .fetch_add(3 * 1024 * 1024, Ordering::Relaxed);
        let report = stats.snapshot().to_string();
        assert!(report.contains("Passes: 1"));
        assert!(report.contains("(3.0M)"));
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(1536), "1.5K");
        assert_eq!(human_size(5 * 1024 * 1024 * 1024 * 1024), "5120.0G");
    }
}
