use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{error::PipelineError, tracking::TrajectoryRecord};

pub const CSV_HEADER: [&str; 4] = ["frame", "track_id", "x_meters", "y_meters"];

/// `<output_dir>/<video file name><suffix>`, e.g. `output/rally.mp4_tracks.csv`
pub fn output_path_for(video_name: &str, output_dir: &Path, suffix: &str) -> PathBuf {
    output_dir.join(format!("{video_name}{suffix}"))
}

/// Write all records in one go. Rows go to a sibling `.partial` file which
/// is renamed over `path` only once everything has been flushed, so an
/// interrupted run never leaves a complete-looking artifact behind.
pub fn write_records(path: &Path, records: &[TrajectoryRecord]) -> Result<(), PipelineError> {
    let output_error = |source: csv::Error| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| output_error(e.into()))?;
        }
    }

    let partial = partial_path(path);
    let written = write_csv(&partial, records)
        .and_then(|()| fs::rename(&partial, path).map_err(csv::Error::from));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&partial) {
            warn!("Could not remove partial output {:?}: {}", partial, cleanup);
        }
        return Err(output_error(e));
    }

    info!("Wrote {} trajectory records to {:?}", records.len(), path);
    Ok(())
}

fn write_csv(path: &Path, records: &[TrajectoryRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(CSV_HEADER)?;
    for r in records {
        // Display for f64 never uses exponent notation
        wtr.write_record([
            r.frame.to_string(),
            r.track_id.to_string(),
            r.x_meters.to_string(),
            r.y_meters.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
