//! Frame-sequential reprojection loop

use std::fmt;
use std::time::{Duration, Instant};

use ndarray::Array2;
use reproj_core::{CalibrationError, CameraModel, DisparityMap, PointCloud, PointCloudBuilder};
use reproj_io::IoError;
use reproj_matching::{MatchError, StereoMatcher};
use thiserror::Error;
use tracing::{debug, info, info_span};

/// Stage of a single frame's processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    LoadingFrame,
    RunningMatcher,
    BuildingPointCloud,
    Persisting,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameStage::LoadingFrame => "loading frame",
            FrameStage::RunningMatcher => "running matcher",
            FrameStage::BuildingPointCloud => "building point cloud",
            FrameStage::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("Matching failed: {0}")]
    Matching(#[from] MatchError),
}

/// Fatal error that stopped the sequence
#[derive(Error, Debug)]
#[error("frame {frame}: {stage} failed: {source}")]
pub struct SequenceError {
    pub frame: u32,
    pub stage: FrameStage,
    #[source]
    pub source: FrameError,
}

/// Everything needed to process one frame
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub left: Array2<u8>,
    pub right: Array2<u8>,
    pub camera: CameraModel,
}

/// Supplies stereo pairs and calibration per frame number
pub trait FrameSource {
    /// `Ok(None)` when either image of the pair is unavailable, which ends
    /// the sequence. Errors are fatal.
    fn load(&mut self, frame: u32) -> Result<Option<FrameInput>, FrameError>;
}

/// Results of one processed frame, handed to every sink
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput<'a> {
    pub frame: u32,
    pub camera: &'a CameraModel,
    pub disparity: &'a DisparityMap,
    pub cloud: &'a PointCloud,
    /// Wall-clock time of the matcher call alone
    pub match_time: Duration,
}

/// Consumer of processed frames.
///
/// Every sink stages a frame before any sink commits it. If staging or
/// committing fails anywhere, the sinks that staged the frame discard it, so
/// a failed frame leaves no artifact behind.
pub trait FrameSink {
    /// Prepare this frame's artifacts without publishing them
    fn stage(&mut self, output: &FrameOutput<'_>) -> Result<(), FrameError>;

    /// Publish what was staged for the current frame
    fn commit(&mut self) -> Result<(), FrameError>;

    /// Drop everything staged or committed for the current frame
    fn discard(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SequenceSummary {
    pub frames_processed: u32,
    pub total_points: usize,
    pub total_match_time: Duration,
}

pub const DEFAULT_FIRST_FRAME: u32 = 1;

/// Drives load → match → reproject → persist until the source runs dry
pub struct FrameSequencer<S, M> {
    source: S,
    matcher: M,
    sinks: Vec<Box<dyn FrameSink>>,
    first_frame: u32,
}

impl<S: FrameSource, M: StereoMatcher> FrameSequencer<S, M> {
    pub fn new(source: S, matcher: M) -> Self {
        Self {
            source,
            matcher,
            sinks: Vec::new(),
            first_frame: DEFAULT_FIRST_FRAME,
        }
    }

    pub fn first_frame(mut self, frame: u32) -> Self {
        self.first_frame = frame;
        self
    }

    /// Sinks run in registration order
    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Process frames until the source reports the end of the sequence
    pub fn run(&mut self) -> Result<SequenceSummary, SequenceError> {
        let mut summary = SequenceSummary::default();
        let mut frame = self.first_frame;

        loop {
            let Some((points, match_time)) = self.process_frame(frame)? else {
                break;
            };
            summary.frames_processed += 1;
            summary.total_points += points;
            summary.total_match_time += match_time;

            let Some(next) = frame.checked_add(1) else {
                break;
            };
            frame = next;
        }

        info!(
            frames = summary.frames_processed,
            points = summary.total_points,
            "sequence terminated"
        );
        Ok(summary)
    }

    /// Returns the number of points and the matcher time, or `None` at the
    /// end of the sequence
    fn process_frame(&mut self, frame: u32) -> Result<Option<(usize, Duration)>, SequenceError> {
        let _span = info_span!("frame", frame).entered();
        let fail = |stage: FrameStage| move |source: FrameError| SequenceError { frame, stage, source };

        debug!(stage = %FrameStage::LoadingFrame, "entering stage");
        let Some(input) = self
            .source
            .load(frame)
            .map_err(fail(FrameStage::LoadingFrame))?
        else {
            debug!("end of sequence");
            return Ok(None);
        };

        debug!(stage = %FrameStage::RunningMatcher, "entering stage");
        let started = Instant::now();
        let output = self
            .matcher
            .compute(input.left.view(), input.right.view())
            .map_err(|e| fail(FrameStage::RunningMatcher)(e.into()))?;
        let match_time = started.elapsed();

        debug!(stage = %FrameStage::BuildingPointCloud, "entering stage");
        let disparity = DisparityMap::from_fixed_point(output.disparity.view(), output.subpixel_scale);
        let cloud = PointCloudBuilder::build(&disparity, &input.camera);

        debug!(stage = %FrameStage::Persisting, "entering stage");
        let result = FrameOutput {
            frame,
            camera: &input.camera,
            disparity: &disparity,
            cloud: &cloud,
            match_time,
        };
        persist(&mut self.sinks, &result).map_err(fail(FrameStage::Persisting))?;

        let secs = match_time.as_secs_f64();
        info!(
            points = cloud.len(),
            match_ms = format_args!("{:.1}", secs * 1e3),
            fps = format_args!("{:.1}", if secs > 0.0 { 1.0 / secs } else { f64::INFINITY }),
            "processed frame"
        );

        Ok(Some((cloud.len(), match_time)))
    }
}

/// Stage on every sink, then commit on every sink. On failure, the sinks that
/// already staged this frame discard it.
fn persist(sinks: &mut [Box<dyn FrameSink>], output: &FrameOutput<'_>) -> Result<(), FrameError> {
    for i in 0..sinks.len() {
        if let Err(err) = sinks[i].stage(output) {
            discard(&mut sinks[..=i]);
            return Err(err);
        }
    }
    for i in 0..sinks.len() {
        if let Err(err) = sinks[i].commit() {
            discard(sinks);
            return Err(err);
        }
    }
    Ok(())
}

fn discard(sinks: &mut [Box<dyn FrameSink>]) {
    for sink in sinks {
        sink.discard();
    }
}
