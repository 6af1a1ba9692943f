//! Timing utilities for the scan phase of a run

use std::time::{Duration, Instant};

/// A simple timer for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer that starts immediately
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Format a duration as "1.23s", "456ms" or "< 1ms"
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();

    if millis == 0 {
        "< 1ms".to_string()
    } else if millis >= 1000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", millis)
    }
}

/// Timing of one scanner invocation
#[derive(Debug, Clone)]
pub struct ScanTiming {
    /// Scan category label
    pub category: String,
    /// Configured path that was scanned
    pub path: String,
    /// Number of files processed
    pub processed: usize,
    /// Number of files the scan would rewrite
    pub modified: usize,
    /// Duration of the scan
    pub duration: Duration,
}

/// Timings of every scan of a run, in execution order
#[derive(Debug, Clone, Default)]
pub struct ScanTimings {
    scans: Vec<ScanTiming>,
}

impl ScanTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timing: ScanTiming) {
        self.scans.push(timing);
    }

    pub fn scans(&self) -> &[ScanTiming] {
        &self.scans
    }

    /// Sum of every recorded scan duration
    pub fn total(&self) -> Duration {
        self.scans.iter().map(|s| s.duration).sum()
    }
}
