use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub name: &'static str,
    pub duration: Duration,
}

/// Per-stage durations of one capture cycle.
#[derive(Debug, Default)]
pub struct CycleTimings {
    stages: Vec<StageTiming>,
}

impl CycleTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, name: &'static str, duration: Duration) {
        self.stages.push(StageTiming { name, duration });
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn get_stage(&self, name: &str) -> Option<Duration> {
        self.stages.iter().find(|s| s.name == name).map(|s| s.duration)
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn log_summary(&self) {
        if self.stages.is_empty() {
            return;
        }
        for stage in &self.stages {
            debug!(
                stage = stage.name,
                "{:.3}ms",
                stage.duration.as_secs_f64() * 1000.0
            );
        }
        debug!("Cycle total: {:.3}ms", self.total_duration().as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn stop(self, timings: &mut CycleTimings) {
        timings.add_stage(self.name, self.start.elapsed());
    }
}
