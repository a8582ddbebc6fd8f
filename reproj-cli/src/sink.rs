use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use reproj_core::DepthColorMapper;
use reproj_io::visualize::{render_disparity, render_top_down, save_png};
use reproj_io::{frame_file_name, stage_csv, stage_kitti_bin, IoError, StagedFile};
use tracing::{debug, warn};

use crate::sequencer::{FrameError, FrameOutput, FrameSink};

fn ensure_dir(dir: &Path) -> Result<PathBuf, IoError> {
    fs::create_dir_all(dir).map_err(|e| IoError::file(dir, e))?;
    Ok(dir.to_path_buf())
}

fn remove_all(paths: &mut Vec<PathBuf>) {
    for path in paths.drain(..) {
        if let Err(err) = fs::remove_file(&path) {
            warn!(path = %path.display(), %err, "could not remove output of failed frame");
        }
    }
}

/// Files of the frame in flight, staged or already renamed into place
#[derive(Debug, Default)]
struct FrameFiles {
    staged: Vec<StagedFile>,
    committed: Vec<PathBuf>,
}

impl FrameFiles {
    /// Forget the previous frame and stage `file` for the new one
    fn begin(&mut self, file: StagedFile) {
        self.staged.clear();
        self.committed.clear();
        self.staged.push(file);
    }

    fn commit(&mut self) -> Result<(), IoError> {
        for file in self.staged.drain(..) {
            let path = file.commit()?;
            debug!(path = %path.display(), "wrote point cloud");
            self.committed.push(path);
        }
        Ok(())
    }

    fn discard(&mut self) {
        self.staged.clear();
        remove_all(&mut self.committed);
    }
}

/// `<dir>/<frame:06>.csv` with one `X;Y;Z` line per point
#[derive(Debug)]
pub struct CsvSink {
    dir: PathBuf,
    files: FrameFiles,
}

impl CsvSink {
    /// Creates the output directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, IoError> {
        Ok(Self {
            dir: ensure_dir(dir.as_ref())?,
            files: FrameFiles::default(),
        })
    }
}

impl FrameSink for CsvSink {
    fn stage(&mut self, output: &FrameOutput<'_>) -> Result<(), FrameError> {
        let path = self.dir.join(frame_file_name(output.frame, "csv"));
        self.files.begin(stage_csv(&path, output.cloud)?);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), FrameError> {
        Ok(self.files.commit()?)
    }

    fn discard(&mut self) {
        self.files.discard();
    }
}

/// `<dir>/<frame:06>.bin`, KITTI velodyne layout with unit reflectance
#[derive(Debug)]
pub struct KittiBinSink {
    dir: PathBuf,
    files: FrameFiles,
}

impl KittiBinSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, IoError> {
        Ok(Self {
            dir: ensure_dir(dir.as_ref())?,
            files: FrameFiles::default(),
        })
    }
}

impl FrameSink for KittiBinSink {
    fn stage(&mut self, output: &FrameOutput<'_>) -> Result<(), FrameError> {
        let path = self.dir.join(frame_file_name(output.frame, "bin"));
        self.files.begin(stage_kitti_bin(&path, output.cloud)?);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), FrameError> {
        Ok(self.files.commit()?)
    }

    fn discard(&mut self) {
        self.files.discard();
    }
}

/// Colorized disparity and top-down point renderings per frame.
///
/// Rendering happens while staging; images are written on commit. Save
/// failures are logged and never stop the sequence.
#[derive(Debug)]
pub struct VisualizationSink {
    dir: PathBuf,
    disp_size: usize,
    mapper: DepthColorMapper,
    pending: Vec<(PathBuf, RgbImage)>,
    saved: Vec<PathBuf>,
}

impl VisualizationSink {
    pub fn new<P: AsRef<Path>>(
        dir: P,
        disp_size: usize,
        mapper: DepthColorMapper,
    ) -> Result<Self, IoError> {
        Ok(Self {
            dir: ensure_dir(dir.as_ref())?,
            disp_size,
            mapper,
            pending: Vec::new(),
            saved: Vec::new(),
        })
    }
}

impl FrameSink for VisualizationSink {
    fn stage(&mut self, output: &FrameOutput<'_>) -> Result<(), FrameError> {
        self.saved.clear();
        let path = |kind: &str| self.dir.join(format!("{:06}_{kind}.png", output.frame));
        self.pending = vec![
            (path("disparity"), render_disparity(output.disparity, self.disp_size)),
            (path("points"), render_top_down(output.cloud, &self.mapper)),
        ];
        Ok(())
    }

    fn commit(&mut self) -> Result<(), FrameError> {
        for (path, img) in self.pending.drain(..) {
            match save_png(&path, &img) {
                Ok(()) => self.saved.push(path),
                Err(err) => warn!(path = %path.display(), %err, "visualization not saved"),
            }
        }
        Ok(())
    }

    fn discard(&mut self) {
        self.pending.clear();
        remove_all(&mut self.saved);
    }
}
