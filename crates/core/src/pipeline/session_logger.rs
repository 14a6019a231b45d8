use std::time::Instant;

use crate::shared::identity::Identity;

/// Cross-cutting logger for tracking-session events.
///
/// Decouples the run loop from specific output mechanisms so callers can
/// observe a session without changing the orchestration code.
pub trait SessionLogger: Send {
    /// Called once per processed frame with the number of detected faces.
    fn frame(&mut self, index: usize, faces: usize);

    fn visit_opened(&mut self, identity: &Identity);

    fn visit_closed(&mut self, identity: &Identity);

    fn snapshot(&mut self, stem: &str);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame(&mut self, _index: usize, _faces: usize) {}
    fn visit_opened(&mut self, _identity: &Identity) {}
    fn visit_closed(&mut self, _identity: &Identity) {}
    fn snapshot(&mut self, _stem: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: logs arrivals and departures as they happen, a
/// progress line every `throttle_frames` frames, and a summary at the end.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    start_time: Instant,
    frames: usize,
    faces: usize,
    opened: usize,
    closed: usize,
    snapshots: usize,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            start_time: Instant::now(),
            frames: 0,
            faces: 0,
            opened: 0,
            closed: 0,
            snapshots: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no frame was seen.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![
            format!("Session summary ({} frames, {elapsed:.1}s):", self.frames),
            format!(
                "  faces per frame: avg {:.1}",
                self.faces as f64 / self.frames as f64
            ),
            format!("  visits opened: {}", self.opened),
            format!("  visits closed: {}", self.closed),
            format!("  unknown snapshots: {}", self.snapshots),
        ];
        if elapsed > 0.0 {
            lines.push(format!("  Throughput: {:.1} fps", self.frames as f64 / elapsed));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame(&mut self, index: usize, faces: usize) {
        self.frames += 1;
        self.faces += faces;
        if self.frames % self.throttle_frames == 0 {
            log::info!("Processed {} frames (last index {index})", self.frames);
        }
    }

    fn visit_opened(&mut self, identity: &Identity) {
        self.opened += 1;
        log::info!("{identity} arrived");
    }

    fn visit_closed(&mut self, identity: &Identity) {
        self.closed += 1;
        log::info!("{identity} left");
    }

    fn snapshot(&mut self, stem: &str) {
        self.snapshots += 1;
        log::debug!("Unknown face captured as {stem}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullSessionLogger;
        logger.frame(0, 2);
        logger.visit_opened(&Identity::from("a"));
        logger.visit_closed(&Identity::from("a"));
        logger.snapshot("1.0");
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_counts_events() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.frame(0, 2);
        logger.frame(1, 0);
        logger.visit_opened(&Identity::from("a"));
        logger.visit_opened(&Identity::unknown());
        logger.visit_closed(&Identity::from("a"));
        logger.snapshot("1.000000");

        assert_eq!(logger.frames, 2);
        assert_eq!(logger.faces, 2);
        assert_eq!(logger.opened, 2);
        assert_eq!(logger.closed, 1);
        assert_eq!(logger.snapshots, 1);
    }

    #[test]
    fn test_summary_includes_counts() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.frame(0, 3);
        logger.frame(1, 1);
        logger.visit_opened(&Identity::from("a"));

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Session summary (2 frames"));
        assert!(summary.contains("avg 2.0"));
        assert!(summary.contains("visits opened: 1"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutSessionLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_info_leaves_counters_alone() {
        let mut logger = StdoutSessionLogger::default();
        logger.info("hello world");
        assert_eq!(logger.throttle_frames, 100);
        assert!(logger.summary_string().is_none());
    }
}
