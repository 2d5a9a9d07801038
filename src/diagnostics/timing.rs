use crate::error::Stage;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Timing entry describing a single stage of a frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Per-stage timing trace of one frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn with_total(total_ms: f64) -> Self {
        Self {
            total_ms,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Run `f`, recording its wall time under the stage name.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.push(stage.to_string(), elapsed_ms(start));
        out
    }

    /// Milliseconds recorded for `stage`, summed over repeated entries.
    pub fn stage_ms(&self, stage: Stage) -> f64 {
        let label = stage.to_string();
        self.stages
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.elapsed_ms)
            .sum()
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
