//! Per-field history for sparklines and update rates.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use telewatch_types::TelemetryData;

/// Samples kept per field.
const MAX_HISTORY_SIZE: usize = 60;

/// Recent numeric values of every field, plus frame arrival times.
///
/// Each sample keeps its own arrival time, since a frame may carry only some
/// of the fields.
#[derive(Debug, Clone, Default)]
pub struct History {
    fields: BTreeMap<String, VecDeque<(Instant, f64)>>,
    timestamps: VecDeque<Instant>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one decoded frame. Non-numeric fields are ignored.
    pub fn record(&mut self, frame: &TelemetryData, at: Instant) {
        for (name, value) in frame {
            let Some(value) = value.as_f64() else {
                continue;
            };
            let samples = self.fields.entry(name.clone()).or_default();
            samples.push_back((at, value));
            if samples.len() > MAX_HISTORY_SIZE {
                samples.pop_front();
            }
        }

        self.timestamps.push_back(at);
        if self.timestamps.len() > MAX_HISTORY_SIZE {
            self.timestamps.pop_front();
        }
    }

    /// Forget everything, e.g. after a reconnect.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.timestamps.clear();
    }

    /// Sparkline levels (0-7) for a field, scaled between its min and max.
    ///
    /// Empty until the field has at least two samples.
    pub fn sparkline(&self, field: &str) -> Vec<u8> {
        let Some(values) = self.fields.get(field) else {
            return Vec::new();
        };
        if values.len() < 2 {
            return Vec::new();
        }

        let min = values.iter().map(|&(_, v)| v).fold(f64::INFINITY, f64::min);
        let max = values.iter().map(|&(_, v)| v).fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        values
            .iter()
            .map(|&(_, v)| {
                if range <= f64::EPSILON {
                    0
                } else {
                    (((v - min) / range) * 7.0).round().clamp(0.0, 7.0) as u8
                }
            })
            .collect()
    }

    /// Frames per second over the retained window.
    pub fn frame_rate(&self) -> Option<f64> {
        let first = self.timestamps.front()?;
        let last = self.timestamps.back()?;
        let elapsed = last.duration_since(*first).as_secs_f64();
        if self.timestamps.len() < 2 || elapsed <= 0.0 {
            return None;
        }
        Some((self.timestamps.len() - 1) as f64 / elapsed)
    }

    /// Change per second of a field between its last two samples.
    pub fn field_rate(&self, field: &str) -> Option<f64> {
        let values = self.fields.get(field)?;
        if values.len() < 2 {
            return None;
        }

        let (current_time, current) = *values.back()?;
        let (previous_time, previous) = *values.get(values.len() - 2)?;
        let elapsed = current_time.duration_since(previous_time).as_secs_f64();

        (elapsed > 0.0).then(|| (current - previous) / elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame(speed: f64) -> TelemetryData {
        TelemetryData::new().with("speed", speed).with("mode", "auto")
    }

    #[test]
    fn test_sparkline_scales_between_min_and_max() {
        let mut history = History::new();
        let start = Instant::now();
        for (i, speed) in [0.0, 3.5, 7.0].into_iter().enumerate() {
            history.record(&frame(speed), start + Duration::from_millis(100 * i as u64));
        }

        assert_eq!(history.sparkline("speed"), vec![0, 4, 7]);
        assert!(history.sparkline("mode").is_empty());
        assert!(history.sparkline("missing").is_empty());
    }

    #[test]
    fn test_rates() {
        let mut history = History::new();
        let start = Instant::now();
        history.record(&frame(1.0), start);
        assert_eq!(history.frame_rate(), None);

        history.record(&frame(3.0), start + Duration::from_millis(500));
        history.record(&frame(4.0), start + Duration::from_secs(1));

        assert!((history.frame_rate().unwrap() - 2.0).abs() < 1e-9);
        assert!((history.field_rate("speed").unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_field_rate_ignores_frames_without_the_field() {
        let mut history = History::new();
        let start = Instant::now();
        history.record(&TelemetryData::new().with("speed", 1.0), start);
        history.record(&TelemetryData::new().with("speed", 3.0), start + Duration::from_secs(1));
        history.record(
            &TelemetryData::new().with("battery", 5.0),
            start + Duration::from_millis(1100),
        );

        assert!((history.field_rate("speed").unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(history.field_rate("battery"), None);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = History::new();
        let start = Instant::now();
        for i in 0..(MAX_HISTORY_SIZE + 10) {
            history.record(&frame(i as f64), start + Duration::from_millis(i as u64));
        }
        assert_eq!(history.sparkline("speed").len(), MAX_HISTORY_SIZE);

        history.clear();
        assert!(history.sparkline("speed").is_empty());
    }
}
