use crate::capture::domain::frame_source::FrameSource;
use crate::capture::unknown_snapshot_writer::UnknownSnapshotWriter;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::session_logger::SessionLogger;
use crate::presence::domain::frame_observation::FrameObservation;
use crate::presence::domain::presence_tracker::PresenceTracker;
use crate::presence::infrastructure::csv_report_writer::CsvReportWriter;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::identity_labeler::IdentityLabeler;
use crate::shared::clock::{Clock, Timestamp};
use crate::shared::frame::Frame;

/// Live presence logging: acquire → detect → recognize → label → snapshot →
/// track → report, once per frame, until stopped.
///
/// Owns the session's [`PresenceTracker`]; nothing else mutates it.
pub struct TrackPresenceUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    recognizer: Box<dyn FaceRecognizer>,
    labeler: IdentityLabeler,
    snapshots: Option<UnknownSnapshotWriter>,
    reports: Option<CsvReportWriter>,
    clock: Box<dyn Clock>,
    logger: Box<dyn SessionLogger>,
    tracker: PresenceTracker,
    last_now: Option<Timestamp>,
}

impl TrackPresenceUseCase {
    /// `snapshots` and `reports` are optional: `None` disables unknown-face
    /// capture and CSV reporting respectively.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        recognizer: Box<dyn FaceRecognizer>,
        labeler: IdentityLabeler,
        snapshots: Option<UnknownSnapshotWriter>,
        reports: Option<CsvReportWriter>,
        clock: Box<dyn Clock>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        Self {
            source,
            detector,
            recognizer,
            labeler,
            snapshots,
            reports,
            clock,
            logger,
            tracker: PresenceTracker::new(),
            last_now: None,
        }
    }

    /// Runs until `should_stop` returns true (checked once per frame) or the
    /// source runs out of frames.
    ///
    /// On a clean exit every open visit is closed and a final report is
    /// written. Errors abort the session immediately; the frame source is
    /// released either way.
    pub fn run(&mut self, should_stop: &dyn Fn() -> bool) -> Result<(), Box<dyn std::error::Error>> {
        let result = self.run_loop(should_stop);
        self.source.release();
        result?;

        let now = self.session_now();
        let closed = self.tracker.close_all(now)?;
        for identity in &closed {
            self.logger.visit_closed(identity);
        }
        self.write_report()?;
        self.logger.summary();
        Ok(())
    }

    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    fn run_loop(&mut self, should_stop: &dyn Fn() -> bool) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            if should_stop() {
                self.logger.info("Stop requested, ending session");
                return Ok(());
            }
            let Some(frame) = self.source.read()? else {
                self.logger.info("Frame source exhausted, ending session");
                return Ok(());
            };
            self.process_frame(&frame)?;
        }
    }

    fn process_frame(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let now = self.session_now();
        let gray = frame.to_grayscale();
        let regions = self.detector.detect(&gray)?;

        let mut observation = FrameObservation::new();
        for region in &regions {
            let Some(face) = gray.crop(region) else {
                log::debug!("Frame {}: ignoring empty region {region:?}", frame.index());
                continue;
            };
            let prediction = self.recognizer.predict(&face)?;
            let identity = self.labeler.label(prediction)?;
            log::trace!(
                "Frame {}: {region:?} -> {identity} ({:.1})",
                frame.index(),
                prediction.confidence
            );

            let snapshot_ref = match &self.snapshots {
                Some(writer) if identity.is_unknown() => {
                    let stem = writer.capture(frame, region, now)?;
                    self.logger.snapshot(&stem);
                    Some(stem)
                }
                _ => None,
            };
            observation.add(identity, snapshot_ref);
        }

        let change = self.tracker.observe(&observation, now)?;
        for identity in &change.opened {
            self.logger.visit_opened(identity);
        }
        for identity in &change.closed {
            self.logger.visit_closed(identity);
        }

        self.write_report()?;
        self.logger.frame(frame.index(), regions.len());
        Ok(())
    }

    /// Reads the clock, holding at the previous reading when the wall clock
    /// steps back so visit times never run backwards.
    fn session_now(&mut self) -> Timestamp {
        let now = self.clock.now();
        match self.last_now {
            Some(last) if now < last => {
                log::warn!("System clock moved back from {last} to {now}; holding at {last}");
                last
            }
            _ => {
                self.last_now = Some(now);
                now
            }
        }
    }

    fn write_report(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(reports) = self.reports.as_mut() {
            reports.write(self.tracker.ledger())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::image_writer::ImageWriter;
    use crate::pipeline::session_logger::NullSessionLogger;
    use crate::recognition::domain::face_recognizer::Prediction;
    use crate::recognition::domain::identity_labeler::{AcceptanceBand, LabelError};
    use crate::recognition::domain::label_map::LabelMap;
    use crate::shared::clock::Timestamp;
    use crate::shared::identity::Identity;
    use crate::shared::region::FaceRegion;
    use chrono::{Local, TimeZone};
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubSource {
        frames: VecDeque<Frame>,
        released: Arc<Mutex<bool>>,
    }

    impl FrameSource for StubSource {
        fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            Ok(self.frames.pop_front())
        }

        fn release(&mut self) {
            *self.released.lock().unwrap() = true;
        }
    }

    /// Region x coordinate encodes the face's brightness, which the stub
    /// recognizer reads back as the predicted label.
    struct StubDetector {
        per_frame: Vec<Vec<FaceRegion>>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
            assert_eq!(frame.channels(), 1, "detector must receive grayscale");
            Ok(self.per_frame.get(frame.index()).cloned().unwrap_or_default())
        }
    }

    /// Predicts `label_id = x / 10` of the crop's source region, read from
    /// the first pixel value, with confidence 50 unless the label is 9.
    struct StubRecognizer;

    impl FaceRecognizer for StubRecognizer {
        fn predict(&self, face: &Frame) -> Result<Prediction, Box<dyn std::error::Error>> {
            let label_id = face.data()[0] as i32;
            let confidence = if label_id == 9 { 120.0 } else { 50.0 };
            Ok(Prediction {
                label_id,
                confidence,
            })
        }
    }

    struct StubClock {
        tick: AtomicUsize,
    }

    impl Clock for StubClock {
        fn now(&self) -> Timestamp {
            let t = self.tick.fetch_add(1, Ordering::SeqCst) as i64;
            Local.timestamp_opt(1_700_000_000 + t, 0).unwrap()
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    /// 40x10 grayscale frame whose columns 0-9, 10-19, 20-29, 30-39 carry
    /// the values 0, 1, 2, 9: a region at x = 10 * k crops a face of label k.
    fn frame(index: usize) -> Frame {
        let mut data = Vec::with_capacity(400);
        for _ in 0..10 {
            for col in 0..40u8 {
                data.push(match col / 10 {
                    3 => 9,
                    k => k,
                });
            }
        }
        Frame::new(data, 40, 10, 1, index)
    }

    fn face(slot: i32) -> FaceRegion {
        FaceRegion::new(slot * 10, 0, 10, 10)
    }

    fn labeler() -> IdentityLabeler {
        let labels = LabelMap::from_iter([
            (0, Identity::from("alice")),
            (1, Identity::from("bob")),
        ]);
        IdentityLabeler::new(labels, AcceptanceBand::default())
    }

    struct Harness {
        use_case: TrackPresenceUseCase,
        released: Arc<Mutex<bool>>,
        snapshots: Arc<Mutex<Vec<PathBuf>>>,
    }

    fn harness(per_frame: Vec<Vec<FaceRegion>>, capture_unknown: bool) -> Harness {
        let released = Arc::new(Mutex::new(false));
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let source = StubSource {
            frames: (0..per_frame.len()).map(frame).collect(),
            released: released.clone(),
        };
        let snapshot_writer = capture_unknown.then(|| {
            UnknownSnapshotWriter::new(
                PathBuf::from("/snapshots"),
                Box::new(StubImageWriter {
                    written: snapshots.clone(),
                }),
            )
        });
        let use_case = TrackPresenceUseCase::new(
            Box::new(source),
            Box::new(StubDetector { per_frame }),
            Box::new(StubRecognizer),
            labeler(),
            snapshot_writer,
            None,
            Box::new(StubClock {
                tick: AtomicUsize::new(0),
            }),
            Box::new(NullSessionLogger),
        );
        Harness {
            use_case,
            released,
            snapshots,
        }
    }

    fn at(tick: i64) -> Timestamp {
        Local.timestamp_opt(1_700_000_000 + tick, 0).unwrap()
    }

    #[test]
    fn test_runs_until_source_exhausted_and_closes_visits() {
        let mut h = harness(vec![vec![face(0)], vec![face(0), face(1)], vec![face(1)]], false);
        h.use_case.run(&|| false).unwrap();

        let ledger = h.use_case.tracker().ledger();
        let alice = ledger.records(&Identity::from("alice"));
        assert_eq!(alice.len(), 1);
        assert_eq!((alice[0].start(), alice[0].end()), (at(0), Some(at(2))));

        let bob = ledger.records(&Identity::from("bob"));
        assert_eq!((bob[0].start(), bob[0].end()), (at(1), Some(at(3))));
        assert!(h.use_case.tracker().active().is_empty());
        assert!(*h.released.lock().unwrap());
    }

    /// Replays fixed millisecond readings, one per call.
    struct SteppingClock {
        millis: Mutex<VecDeque<i64>>,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Timestamp {
            let ms = self.millis.lock().unwrap().pop_front().unwrap();
            Local.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
        }
    }

    #[test]
    fn test_clock_stepping_back_keeps_session_running() {
        let mut h = harness(vec![vec![face(0)], vec![], vec![face(0)]], false);
        h.use_case.clock = Box::new(SteppingClock {
            millis: Mutex::new(VecDeque::from([1000, 999, 1500, 1600])),
        });
        h.use_case.run(&|| false).unwrap();

        let ms = |ms: i64| Local.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap();
        let alice = h.use_case.tracker().ledger().records(&Identity::from("alice"));
        assert_eq!(alice.len(), 2);
        // The backward reading is held at the previous one.
        assert_eq!((alice[0].start(), alice[0].end()), (ms(1000), Some(ms(1000))));
        assert_eq!((alice[1].start(), alice[1].end()), (ms(1500), Some(ms(1600))));
        assert!(alice.iter().all(|r| r.end().is_some_and(|end| r.start() <= end)));
    }

    #[test]
    fn test_stop_signal_checked_each_frame() {
        let mut h = harness(vec![vec![face(0)]; 10], false);
        let polls = Cell::new(0);
        let should_stop = || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        };
        h.use_case.run(&should_stop).unwrap();

        assert_eq!(polls.get(), 4);
        let alice = h.use_case.tracker().ledger().records(&Identity::from("alice"));
        assert_eq!(alice.len(), 1);
        // Three frames at ticks 0-2, closed by the final clock read.
        assert_eq!(alice[0].end(), Some(at(3)));
        assert!(*h.released.lock().unwrap());
    }

    #[test]
    fn test_unknown_faces_are_captured_and_linked() {
        let mut h = harness(vec![vec![face(3)], vec![face(3)]], true);
        h.use_case.run(&|| false).unwrap();

        let unknown = h.use_case.tracker().ledger().records(&Identity::unknown());
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].snapshot_ref(), Some("1700000000.000000"));
        // One snapshot pair per frame in which the unknown face was seen.
        assert_eq!(h.snapshots.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_capture_disabled_leaves_no_snapshot_ref() {
        let mut h = harness(vec![vec![face(3)]], false);
        h.use_case.run(&|| false).unwrap();
        let unknown = h.use_case.tracker().ledger().records(&Identity::unknown());
        assert_eq!(unknown[0].snapshot_ref(), None);
        assert!(h.snapshots.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unmapped_label_aborts_session() {
        let mut h = harness(vec![vec![face(2)]], false);
        let err = h.use_case.run(&|| false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LabelError>(),
            Some(&LabelError::UnmappedLabel { label_id: 2 })
        );
        assert!(*h.released.lock().unwrap());
    }

    #[test]
    fn test_regions_outside_frame_are_ignored() {
        let mut h = harness(vec![vec![FaceRegion::new(100, 100, 5, 5)]], false);
        h.use_case.run(&|| false).unwrap();
        assert_eq!(h.use_case.tracker().ledger().total_records(), 0);
    }

    #[test]
    fn test_writes_reports_each_frame() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut h = harness(vec![vec![face(0)]], false);
        h.use_case.reports = Some(CsvReportWriter::new(tmp.path().to_path_buf()));
        h.use_case.run(&|| false).unwrap();

        let alice = std::fs::read_to_string(tmp.path().join("alice.csv")).unwrap();
        assert_eq!(alice.lines().count(), 2);
        assert!(!alice.lines().nth(1).unwrap().ends_with(",,"));
    }

    #[test]
    fn test_session_over_file_backed_adapters() {
        use crate::capture::infrastructure::image_sequence_source::ImageSequenceSource;
        use crate::detection::infrastructure::sidecar_face_detector::SidecarFaceDetector;
        use crate::recognition::infrastructure::lbp_face_recognizer::LbpFaceRecognizer;
        use crate::shared::workspace_layout::WorkspaceLayout;
        use std::fs;

        let tmp = tempfile::TempDir::new().unwrap();
        let layout = WorkspaceLayout::load(tmp.path());
        let gradient = |x: u32, _y: u32| -> u8 { (x * 4) as u8 };
        let checker = |x: u32, y: u32| -> u8 { if (x / 4 + y / 4) % 2 == 0 { 0 } else { 255 } };

        for (name, pixel) in [("carol", &gradient as &dyn Fn(u32, u32) -> u8), ("dave", &checker)] {
            let dir = layout.dataset().join(name);
            fs::create_dir_all(&dir).unwrap();
            image::GrayImage::from_fn(64, 64, |x, y| image::Luma([pixel(x, y)]))
                .save(dir.join("1.png"))
                .unwrap();
        }
        let trained = LbpFaceRecognizer::train(&layout.dataset()).unwrap();

        // Frame 0 shows carol full-frame; frame 1 is empty.
        let camera = layout.camera(0);
        fs::create_dir_all(&camera).unwrap();
        for name in ["0000.png", "0001.png"] {
            image::RgbImage::from_fn(64, 64, |x, y| {
                let v = gradient(x, y);
                image::Rgb([v, v, v])
            })
            .save(camera.join(name))
            .unwrap();
        }
        fs::write(camera.join("0000.json"), r#"[{"x": 0, "y": 0, "w": 64, "h": 64}]"#).unwrap();

        let source = ImageSequenceSource::open(&camera).unwrap();
        let detector = SidecarFaceDetector::new(source.frame_paths().to_vec());
        let mut use_case = TrackPresenceUseCase::new(
            Box::new(source),
            Box::new(detector),
            Box::new(trained.recognizer),
            IdentityLabeler::new(trained.labels, AcceptanceBand::new(0.0, 1e9).unwrap()),
            None,
            Some(CsvReportWriter::new(layout.reports())),
            Box::new(StubClock {
                tick: AtomicUsize::new(0),
            }),
            Box::new(NullSessionLogger),
        );
        use_case.run(&|| false).unwrap();

        let carol = use_case.tracker().ledger().records(&Identity::from("carol"));
        assert_eq!(carol.len(), 1);
        assert_eq!((carol[0].start(), carol[0].end()), (at(0), Some(at(1))));
        assert!(use_case.tracker().ledger().records(&Identity::from("dave")).is_empty());

        let report = fs::read_to_string(layout.reports().join("carol.csv")).unwrap();
        assert_eq!(report.lines().count(), 2);
    }
}
