use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::capture_pipeline::sensor::device::TriggerSensor;

/// Turns a stream of levels into rising-edge events.
#[derive(Debug, Default, Clone, Copy)]
pub struct RisingEdge {
    previous: bool,
}

impl RisingEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` on a low-to-high transition.
    pub fn update(&mut self, level: bool) -> bool {
        let rising = level && !self.previous;
        self.previous = level;
        rising
    }
}

/// "A trigger occurred" flag shared between the edge watcher and the
/// capture loop. Several edges before the next drain collapse into one.
#[derive(Debug, Clone, Default)]
pub struct TriggerLatch {
    fired: Arc<AtomicBool>,
}

impl TriggerLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Clears the flag and reports whether it was set.
    pub fn take(&self) -> bool {
        self.fired.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Polls `sensor` every `poll_interval` on a background thread and calls
/// `on_edge` for each rising edge until `running` is cleared.
///
/// `on_edge` runs on the watcher thread and must not block.
pub fn spawn_edge_watcher<S, F>(
    mut sensor: S,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    on_edge: F,
) -> std::io::Result<JoinHandle<()>>
where
    S: TriggerSensor + Send + 'static,
    F: Fn() + Send + 'static,
{
    thread::Builder::new()
        .name("edge-watcher".to_string())
        .spawn(move || {
            let mut edge = RisingEdge::new();
            let mut failing = false;
            while running.load(Ordering::Relaxed) {
                match sensor.poll_level() {
                    Ok(level) => {
                        if failing {
                            debug!("Sensor readable again");
                            failing = false;
                        }
                        if edge.update(level) {
                            debug!("Rising edge on trigger sensor");
                            on_edge();
                        }
                    }
                    Err(e) => {
                        // Log once per outage, not once per poll.
                        if !failing {
                            warn!("Trigger sensor read failed: {}", e);
                            failing = true;
                        }
                    }
                }
                thread::sleep(poll_interval);
            }
            debug!("Edge watcher stopped");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_pipeline::common::error::Result;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn rising_edge_fires_once_per_transition() {
        let mut edge = RisingEdge::new();
        let levels = [false, true, true, false, true, false, false];
        let edges: Vec<bool> = levels.iter().map(|&l| edge.update(l)).collect();
        assert_eq!(edges, vec![false, true, false, false, true, false, false]);
    }

    #[test]
    fn latch_collapses_multiple_fires() {
        let latch = TriggerLatch::new();
        assert!(!latch.take());

        latch.fire();
        latch.clone().fire();
        assert!(latch.is_set());
        assert!(latch.take());
        assert!(!latch.take());
    }

    struct ScriptedSensor {
        levels: VecDeque<bool>,
        running: Arc<AtomicBool>,
    }

    impl TriggerSensor for ScriptedSensor {
        fn poll_level(&mut self) -> Result<bool> {
            match self.levels.pop_front() {
                Some(level) => Ok(level),
                None => {
                    self.running.store(false, Ordering::Relaxed);
                    Ok(false)
                }
            }
        }
    }

    #[test]
    fn watcher_reports_each_rising_edge() {
        let running = Arc::new(AtomicBool::new(true));
        let sensor = ScriptedSensor {
            levels: VecDeque::from(vec![false, true, true, false, true, true, false]),
            running: running.clone(),
        };
        let edges = Arc::new(AtomicUsize::new(0));
        let counter = edges.clone();

        let handle = spawn_edge_watcher(sensor, Duration::from_millis(1), running, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        handle.join().unwrap();

        assert_eq!(edges.load(Ordering::SeqCst), 2);
    }
}
