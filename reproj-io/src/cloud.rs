//! Point cloud output artifacts

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use reproj_core::{Point3D, PointCloud};

use crate::error::{IoError, Result};

/// Reflectance written for every point in KITTI velodyne-style files
const KITTI_REFLECTANCE: f32 = 1.0;

const CSV_DELIMITER: u8 = b';';

/// `<frame zero-padded to 6 digits>.<extension>`
pub fn frame_file_name(frame: u32, extension: &str) -> String {
    format!("{frame:06}.{extension}")
}

/// A fully written file that is not yet visible under its final name.
///
/// Dropping it without [`StagedFile::commit`] removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Final path the file appears at on commit
    pub fn path(&self) -> &Path {
        &self.dest
    }

    /// Rename into place and return the final path
    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.tmp, &self.dest).map_err(|e| IoError::file(&self.dest, e))?;
        self.committed = true;
        Ok(self.dest.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Stage one `X;Y;Z` record per point, no header
pub fn stage_csv<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> Result<StagedFile> {
    stage(path.as_ref(), |w| {
        let mut wtr = WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .has_headers(false)
            .from_writer(w);
        for p in cloud {
            wtr.write_record([p.x.to_string(), p.y.to_string(), p.z.to_string()])?;
        }
        wtr.flush()
    })
}

/// Stage little-endian `f32` quadruples `x, y, z, reflectance`
pub fn stage_kitti_bin<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> Result<StagedFile> {
    stage(path.as_ref(), |w| {
        for p in cloud {
            for v in [p.x, p.y, p.z, KITTI_REFLECTANCE] {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        Ok(())
    })
}

/// Write one `X;Y;Z` line per point, no header.
///
/// The file appears under its final name only once fully written.
pub fn write_csv<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> Result<()> {
    stage_csv(path, cloud)?.commit().map(drop)
}

/// [`stage_kitti_bin`] followed by an immediate commit
pub fn write_kitti_bin<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> Result<()> {
    stage_kitti_bin(path, cloud)?.commit().map(drop)
}

/// Read a point cloud written by [`write_csv`]
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Point3D>> {
    let path = path.as_ref();
    let csv_err = |source: csv::Error| IoError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    let mut points = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(csv_err)?;
        if rec.len() != 3 {
            return Err(invalid_data(
                path,
                format!("record {}: expected 3 values, found {}", idx + 1, rec.len()),
            ));
        }
        let coord = |i: usize| {
            rec[i]
                .trim()
                .parse::<f32>()
                .map_err(|e| invalid_data(path, format!("record {}: {e}", idx + 1)))
        };
        points.push(Point3D::new(coord(0)?, coord(1)?, coord(2)?));
    }
    Ok(points)
}

fn invalid_data(path: &Path, msg: String) -> IoError {
    IoError::file(path, io::Error::new(io::ErrorKind::InvalidData, msg))
}

fn stage<F>(path: &Path, write: F) -> Result<StagedFile>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let staged = StagedFile {
        tmp: tmp_path(path),
        dest: path.to_path_buf(),
        committed: false,
    };
    let result = (|| -> io::Result<()> {
        let mut w = BufWriter::new(File::create(&staged.tmp)?);
        write(&mut w)?;
        w.flush()
    })();

    // on error, dropping `staged` removes the partial temp file
    result.map_err(|e| IoError::file(path, e))?;
    Ok(staged)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
