use std::{env, time::Duration};

use crate::{
    error::TrimError,
    globals::{
        COLLECTION_BACKOFF, PAGE_SCAN_INTERVAL, REGIONS_PER_PAGE, REGION_GRANULE_SIZE,
        REGION_WORK_INTERVAL, RETRIM_INTERVAL, STOPPED_POLL_COUNT, STOPPED_POLL_INTERVAL,
    },
};

pub const TRIM_ENABLED_VAR: &str = "COMET_GC_TRIM";
pub const TRIM_RETRIM_MS_VAR: &str = "COMET_GC_TRIM_RETRIM_MS";
pub const TRIM_VERBOSE_VAR: &str = "COMET_GC_TRIM_VERBOSE";

/// Configuration for the trimmer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrimConfig {
    /// Spawn the background trimmer thread at all.
    pub enabled: bool,
    /// Minimum time between two full passes over the heap.
    pub retrim_interval: Duration,
    /// Pacing sleep before every page.
    pub page_interval: Duration,
    /// Pacing sleep after every region that was coalesced or decommitted.
    pub region_work_interval: Duration,
    /// Pacing sleep after a gen1 collection was observed mid-page.
    pub collection_backoff: Duration,
    /// How often a stopped trimmer rechecks its state before parking.
    pub stopped_poll_interval: Duration,
    /// How many rechecks a stopped trimmer does before parking.
    pub stopped_poll_count: usize,
    /// Report statistics at `info` level after every pass.
    pub verbose: bool,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retrim_interval: RETRIM_INTERVAL,
            page_interval: PAGE_SCAN_INTERVAL,
            region_work_interval: REGION_WORK_INTERVAL,
            collection_backoff: COLLECTION_BACKOFF,
            stopped_poll_interval: STOPPED_POLL_INTERVAL,
            stopped_poll_count: STOPPED_POLL_COUNT,
            verbose: false,
        }
    }
}

impl TrimConfig {
    /// Default configuration with overrides taken from the process environment.
    pub fn from_env() -> Result<Self, TrimError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        mut lookup: impl FnMut(&'static str) -> Option<String>,
    ) -> Result<Self, TrimError> {
        let mut config = Self::default();
        if let Some(value) = lookup(TRIM_ENABLED_VAR) {
            config.enabled = parse_flag(TRIM_ENABLED_VAR, value)?;
        }
        if let Some(value) = lookup(TRIM_RETRIM_MS_VAR) {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|_| TrimError::InvalidConfig {
                    var: TRIM_RETRIM_MS_VAR,
                    value,
                })?;
            config.retrim_interval = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(TRIM_VERBOSE_VAR) {
            config.verbose = parse_flag(TRIM_VERBOSE_VAR, value)?;
        }
        Ok(config)
    }

    /// Configuration that never spawns a background thread.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, TrimError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(TrimError::InvalidConfig { var, value }),
    }
}

/// Geometry of the reference region heap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    pub page_count: usize,
    pub regions_per_page: usize,
    /// Size of one region granule in bytes. Must be a multiple of the OS page size.
    pub granule_size: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            page_count: 4,
            regions_per_page: REGIONS_PER_PAGE,
            granule_size: REGION_GRANULE_SIZE,
        }
    }
}

impl HeapConfig {
    pub fn page_size(&self) -> usize {
        self.regions_per_page * self.granule_size
    }
}
