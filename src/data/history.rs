//! Per-cycle KPI history for sparklines.

use std::collections::VecDeque;
use std::time::Instant;

use super::facets::SummaryKpis;

/// Maximum number of cycles to keep.
const MAX_HISTORY_SIZE: usize = 60;

/// Tracks the mean temperature/humidity reported by each applied cycle.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub temperature: VecDeque<f64>,
    pub humidity: VecDeque<f64>,
    pub violations: VecDeque<u64>,
    pub timestamps: VecDeque<Instant>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cycle's summary.
    ///
    /// A summary missing either mean is skipped as a whole, so every series
    /// stays index-aligned with `timestamps`. Returns whether it was kept.
    pub fn record(&mut self, kpis: &SummaryKpis, at: Instant) -> bool {
        let (Some(t), Some(h)) = (kpis.temperature_mean, kpis.humidity_mean) else {
            return false;
        };
        push_bounded(&mut self.temperature, t);
        push_bounded(&mut self.humidity, h);
        push_bounded(&mut self.violations, kpis.violations_count);
        push_bounded(&mut self.timestamps, at);
        true
    }

    pub fn temperature_sparkline(&self) -> Vec<u8> {
        normalize(self.temperature.iter().copied())
    }

    pub fn humidity_sparkline(&self) -> Vec<u8> {
        normalize(self.humidity.iter().copied())
    }

    /// Change in violation count between the last two cycles.
    pub fn violations_delta(&self) -> Option<i64> {
        let len = self.violations.len();
        if len < 2 {
            return None;
        }
        Some(self.violations[len - 1] as i64 - self.violations[len - 2] as i64)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, value: T) {
    queue.push_back(value);
    if queue.len() > MAX_HISTORY_SIZE {
        queue.pop_front();
    }
}

/// Normalize values to 0-7 for 8 bar levels. Needs at least two points.
fn normalize(values: impl Iterator<Item = f64>) -> Vec<u8> {
    let values: Vec<f64> = values.collect();
    if values.len() < 2 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            if range <= f64::EPSILON {
                return 3;
            }
            (((v - min) / range) * 7.0).round().clamp(0.0, 7.0) as u8
        })
        .collect()
}
