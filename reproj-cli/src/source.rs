use reproj_io::{load_gray, read_calibration, FramePattern};
use tracing::debug;

use crate::sequencer::{FrameError, FrameInput, FrameSource};

/// Reads stereo pairs and calibration files from numbered filename patterns
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    left: FramePattern,
    right: FramePattern,
    calibration: FramePattern,
}

impl FileFrameSource {
    pub fn new(left: FramePattern, right: FramePattern, calibration: FramePattern) -> Self {
        Self {
            left,
            right,
            calibration,
        }
    }
}

impl FrameSource for FileFrameSource {
    fn load(&mut self, frame: u32) -> Result<Option<FrameInput>, FrameError> {
        let left_path = self.left.path(frame);
        let right_path = self.right.path(frame);

        let (Some(left), Some(right)) = (load_gray(&left_path), load_gray(&right_path)) else {
            debug!(left = %left_path.display(), right = %right_path.display(), "stereo pair unavailable");
            return Ok(None);
        };

        // calibration is re-read every frame
        let camera = read_calibration(self.calibration.path(frame))?;

        Ok(Some(FrameInput {
            left,
            right,
            camera,
        }))
    }
}
