//! Disparity-to-point-cloud frame pipeline

pub mod args;
pub mod sequencer;
pub mod sink;
pub mod source;

pub use args::Cli;
pub use sequencer::{
    FrameError, FrameInput, FrameOutput, FrameSequencer, FrameSink, FrameSource, FrameStage,
    SequenceError, SequenceSummary,
};
pub use sink::{CsvSink, KittiBinSink, VisualizationSink};
pub use source::FileFrameSource;

use std::path::PathBuf;

use reproj_core::{DepthColorMapper, ReprojError};
use reproj_io::{FramePattern, IoError};
use reproj_matching::{BlockMatcher, MatchError, StereoMatcher};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("Matcher setup failed: {0}")]
    Matcher(#[from] MatchError),

    #[error("Invalid matcher config {}: {source}", .path.display())]
    MatcherConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid option: {0}")]
    InvalidOption(#[from] ReprojError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Build the pipeline described by the command line and run it to completion
pub fn run(cli: &Cli) -> Result<SequenceSummary, CliError> {
    let source = FileFrameSource::new(
        FramePattern::parse(&cli.left)?,
        FramePattern::parse(&cli.right)?,
        FramePattern::parse(&cli.calibration)?,
    );
    let matcher = BlockMatcher::new(cli.matcher_params()?)?;
    let params = matcher.params();

    info!(
        disp_size = params.disp_size,
        subpixel = params.subpixel,
        uniqueness = params.uniqueness,
        output = %cli.output_dir.display(),
        "starting sequence"
    );
    let disp_size = params.disp_size;

    let mut sequencer = FrameSequencer::new(source, matcher)
        .first_frame(cli.first_frame)
        .with_sink(Box::new(CsvSink::new(&cli.output_dir)?));
    if let Some(dir) = &cli.kitti_bin {
        sequencer = sequencer.with_sink(Box::new(KittiBinSink::new(dir)?));
    }
    if let Some(dir) = &cli.visualize {
        let mapper = DepthColorMapper::with_max_depth(cli.max_depth)?;
        sequencer = sequencer.with_sink(Box::new(VisualizationSink::new(dir, disp_size, mapper)?));
    }

    Ok(sequencer.run()?)
}
