//! Progress events emitted while a conversion runs.

use serde::{Deserialize, Serialize};

/// Conversion phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Parsing,
    Rendering,
}

/// A progress notification. `percent` never decreases within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub percent: u8,
}

impl ProgressEvent {
    pub fn parsing(percent: u8) -> Self {
        Self {
            phase: Phase::Parsing,
            percent: percent.min(100),
        }
    }

    pub fn rendering(percent: u8) -> Self {
        Self {
            phase: Phase::Rendering,
            percent: percent.min(100),
        }
    }

    /// Progress before rendering slide `index` of `total`.
    pub fn before_slide(index: usize, total: usize) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            index as f64 / total as f64
        };
        Self::rendering(15 + (fraction * 70.0).round() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_progress_is_monotonic() {
        let values: Vec<u8> = (0..7).map(|i| ProgressEvent::before_slide(i, 7).percent).collect();
        assert_eq!(values.first(), Some(&15));
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values.iter().all(|v| *v < 95));
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(ProgressEvent::rendering(180).percent, 100);
    }
}
