use std::path::PathBuf;

use clap::{Parser, command};

// Some defaults; some of which can be overriden via CLI args
const CONFIG_FILE_PATH: &str = "./court.json";
const OUTPUT_DIR: &str = "output";
const DETECTIONS_SUFFIX: &str = ".detections.json";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// One or more videos to process
    #[arg(required = true)]
    pub videos: Vec<PathBuf>,

    /// Where to write the trajectory CSV files
    #[arg(long = "outputDir", default_value = OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Where to load pipeline config; defaults are used if the file is missing
    #[arg(long="configPath",default_value_t=String::from(CONFIG_FILE_PATH))]
    pub config_path: String,

    /// Recorded tracker output for each video is read from
    /// `<video path><suffix>`
    #[arg(long="detectionsSuffix",default_value_t=String::from(DETECTIONS_SUFFIX))]
    pub detections_suffix: String,

    /// How many videos to process concurrently
    #[arg(long = "workers", default_value_t = 1)]
    pub workers: usize,

    /// Write the effective config back to configPath before processing
    #[arg(long = "saveConfig")]
    pub save_config: bool,

    #[arg(long = "loglevel",default_value_t=String::from("info"))]
    pub log_level: String,
}
