use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};

use court_mapper::{
    backend_config::load_config_from_file,
    error::{PipelineError, Stage},
    jobs::{JobQueue, JobStatus},
    opencv_support::{BrightnessMaskDetector, HoughLineExtractor, VideoFile},
    pipeline::{Collaborators, process_video},
    replay::ReplayTracker,
};

mod cli;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path)?;
    if cli.save_config {
        config.write_config_to_file(&cli.config_path)?;
    }

    let queue = JobQueue::new(cli.workers);

    for video_path in cli.videos.iter() {
        let label = video_path.display().to_string();
        let video_path = video_path.clone();
        let detections_path = detections_path_for(&video_path, &cli.detections_suffix);
        let output_dir = cli.output_dir.clone();
        let config = config.clone();

        let id = queue.submit(move || {
            let video = VideoFile::new(&video_path);
            let tracker = ReplayTracker::load_from_file(&detections_path)
                .map_err(|e| PipelineError::collaborator(Stage::Tracking, e.into()))?;
            let mut collaborators = Collaborators {
                mask_detector: BrightnessMaskDetector::new(&config),
                line_extractor: HoughLineExtractor::new(&config),
                tracker,
            };
            process_video(&video, &output_dir, &config, &mut collaborators)
        });
        info!("Queued job {} for {}", id, label);
    }

    let statuses = queue.join();
    let mut failures = 0;
    for (id, status) in statuses.iter() {
        println!("{}", serde_json::to_string(&(id, status))?);
        if let JobStatus::Failed { error } = status {
            error!("Job {} failed: {}", id, error);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} videos failed", failures, statuses.len());
    }
    Ok(())
}

fn detections_path_for(video_path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(video_path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
